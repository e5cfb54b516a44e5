//! Strategy catalog.
//!
//! Resolves strategy ids to human-readable metadata for status
//! consumers. Failover decisions never consult the catalog.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::failover::types::StrategyId;

/// Presentation metadata for a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMeta {
    pub id: StrategyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub trait StrategyCatalog: Send + Sync {
    fn resolve(&self, id: &StrategyId) -> Option<StrategyMeta>;
}

/// Catalog backed by a map that can be swapped atomically on reload.
#[derive(Debug)]
pub struct StaticCatalog {
    entries: ArcSwap<HashMap<StrategyId, StrategyMeta>>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<StrategyMeta>) -> Self {
        Self {
            entries: ArcSwap::from_pointee(index(entries)),
        }
    }

    /// Replace the whole catalog. Readers see either the old or the new map.
    pub fn replace(&self, entries: Vec<StrategyMeta>) {
        let map = index(entries);
        tracing::info!(strategies = map.len(), "Strategy catalog reloaded");
        self.entries.store(Arc::new(map));
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn index(entries: Vec<StrategyMeta>) -> HashMap<StrategyId, StrategyMeta> {
    entries.into_iter().map(|m| (m.id.clone(), m)).collect()
}

impl StrategyCatalog for StaticCatalog {
    fn resolve(&self, id: &StrategyId) -> Option<StrategyMeta> {
        self.entries.load().get(id).cloned()
    }
}
