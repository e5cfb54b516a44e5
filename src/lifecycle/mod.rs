//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! startup.rs:
//!     Open state file → Restore controller → Catalog + watcher → Admin listener
//!
//! signals.rs:
//!     SIGTERM / Ctrl-C → Shutdown::trigger
//!
//! shutdown.rs:
//!     trigger → admin server drains → reload task exits
//! ```
//!
//! # Design Decisions
//! - The admin listener binds last, after state is restored
//! - An in-flight activation is not awaited on shutdown; nothing about it is persisted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
