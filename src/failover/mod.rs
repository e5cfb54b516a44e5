//! Auto-recovery failover subsystem.
//!
//! # Data Flow
//! ```text
//! Health signal (report_success / report_failure)
//!     → controller.rs (lock, stale check)
//!     → machine.rs (threshold, cooldown, ticket)
//!     → learned.rs (next backup)
//!     → gateway (activate, lock released)
//!     → machine.rs (commit or roll back)
//!     → events.rs (Degraded / Switched / SwitchFailed)
//!
//! Status query:
//!     controller.rs → machine.rs status(now)  (recomputed each call)
//! ```
//!
//! # Design Decisions
//! - Cooldown prevents flapping; no automatic switch while it runs
//! - Learned strategies are the only backup source
//! - Status is in-memory only; config and learned list are persisted

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod learned;
pub mod machine;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerBuilder, FailoverController};
pub use error::{FailoverError, FailoverResult, ValidationError};
pub use events::FailoverEvent;
pub use learned::LearnedStrategies;
pub use types::{
    FailoverConfig, FailoverState, FailoverStatus, HealthOutcome, IgnoreReason, StrategyId,
    SwitchBlock, ThresholdSettings,
};
