//! Health signal derivation.
//!
//! # Data Flow
//! ```text
//! External probing loop checks N services through the active strategy
//!     → verdict.rs (accessible / total vs threshold)
//!     → report_success / report_failure on the controller
//! ```
//!
//! # Design Decisions
//! - The controller consumes one boolean signal per probe round
//! - An empty probe round is inconclusive and reports nothing

pub mod verdict;

pub use verdict::ProbeVerdict;
