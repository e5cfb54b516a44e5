//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! failoverd.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FailoverdConfig (validated)
//!     → lifecycle/startup.rs wires subsystems
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → strategy catalog swapped atomically
//!     → other sections take effect on restart
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Failover thresholds are not file config; they are persisted state
//!   changed only through the configuration command

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ControllerConfig, FailoverdConfig, GatewayConfig, LogFormat,
    ObservabilityConfig, StorageConfig,
};
