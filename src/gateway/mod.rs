//! Activation gateway subsystem.
//!
//! # Data Flow
//! ```text
//! FailoverController decides to switch
//!     → lock released
//!     → ActivationGateway::activate(backup)   (slow, bounded by timeout)
//!     → lock re-acquired, commit or roll back
//! ```
//!
//! # Design Decisions
//! - The gateway is the only component that touches the live strategy
//! - Every activation has a deadline; a timeout is an activation failure
//! - Dropping the activation future cancels it (child processes are killed)

pub mod command;

use async_trait::async_trait;
use thiserror::Error;

use crate::failover::types::StrategyId;

pub use command::CommandGateway;

/// Errors reported by an activation attempt.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The gateway refused the strategy.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Activation did not finish in time.
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// The apply command could not be started.
    #[error("failed to run apply command: {0}")]
    Io(#[from] std::io::Error),

    /// The apply command ran and reported failure.
    #[error("apply command exited with {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },
}

/// Makes a strategy live.
#[async_trait]
pub trait ActivationGateway: Send + Sync {
    async fn activate(&self, strategy: &StrategyId) -> Result<(), ActivationError>;
}
