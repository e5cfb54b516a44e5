//! Persistence of failover policy and learned strategies.
//!
//! # Data Flow
//! ```text
//! startup:  store.load() → PersistedFailover → FailoverController
//! set_config / set_enabled:  store.save_config() → commit in memory
//! first success of a strategy:  store.save_learned()
//! ```
//!
//! # Design Decisions
//! - Runtime status (failure count, cooldown) is never persisted; a
//!   restart is a cold start
//! - Config writes happen before the in-memory commit so a failed write
//!   leaves the controller unchanged

pub mod json_file;
pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::failover::types::{FailoverConfig, StrategyId};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed state file: {0}")]
    Format(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedFailover {
    pub config: FailoverConfig,
    pub learned: Vec<StrategyId>,
}

/// Durable storage used by the controller.
pub trait FailoverStore: Send + Sync {
    fn load(&self) -> Result<PersistedFailover, StoreError>;

    fn save_config(&self, config: &FailoverConfig) -> Result<(), StoreError>;

    fn save_learned(&self, learned: &[StrategyId]) -> Result<(), StoreError>;
}
