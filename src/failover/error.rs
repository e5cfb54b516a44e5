//! Failover error definitions.

use thiserror::Error;

use crate::failover::types::StrategyId;
use crate::gateway::ActivationError;
use crate::storage::StoreError;

/// A configuration value outside its declared domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("max_failures {value} out of range [{min}, {max}]")]
    MaxFailuresOutOfRange { value: u32, min: u32, max: u32 },

    #[error("cooldown_secs {value} out of range [{min}, {max}]")]
    CooldownOutOfRange { value: u32, min: u32, max: u32 },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MaxFailuresOutOfRange { .. } => "max_failures",
            ValidationError::CooldownOutOfRange { .. } => "cooldown_secs",
        }
    }
}

/// Errors returned by controller operations.
#[derive(Debug, Error)]
pub enum FailoverError {
    /// Rejected configuration; nothing was mutated.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// The command referenced a strategy that is no longer current.
    #[error("stale state: expected current strategy {expected}, actual {actual:?}")]
    StaleState {
        expected: StrategyId,
        actual: Option<StrategyId>,
    },

    /// The gateway could not make the backup live.
    #[error("activation of {strategy} failed: {source}")]
    Activation {
        strategy: StrategyId,
        #[source]
        source: ActivationError,
    },

    /// Threshold reached (or manual failover requested) with no eligible backup.
    #[error("no backup strategy available")]
    NoBackupAvailable,

    /// Another activation is still pending.
    #[error("a strategy switch is already in progress")]
    SwitchInProgress,

    /// The switch was superseded (disable or a new current strategy) before it completed.
    #[error("strategy switch cancelled before completion")]
    Cancelled,

    /// Persisting the change failed; in-memory state is unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl FailoverError {
    /// Stable machine-readable kind, used by the admin API.
    pub fn kind(&self) -> &'static str {
        match self {
            FailoverError::Validation(_) => "validation",
            FailoverError::StaleState { .. } => "stale_state",
            FailoverError::Activation { .. } => "activation",
            FailoverError::NoBackupAvailable => "no_backup_available",
            FailoverError::SwitchInProgress => "switch_in_progress",
            FailoverError::Cancelled => "cancelled",
            FailoverError::Storage(_) => "storage",
        }
    }
}

/// Result type for controller operations.
pub type FailoverResult<T> = Result<T, FailoverError>;
