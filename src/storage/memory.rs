//! In-memory store for tests and ephemeral runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::failover::types::{FailoverConfig, StrategyId};
use crate::storage::{FailoverStore, PersistedFailover, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<PersistedFailover>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(doc: PersistedFailover) -> Self {
        Self {
            doc: Mutex::new(doc),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> PersistedFailover {
        self.doc.lock().clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl FailoverStore for MemoryStore {
    fn load(&self) -> Result<PersistedFailover, StoreError> {
        Ok(self.snapshot())
    }

    fn save_config(&self, config: &FailoverConfig) -> Result<(), StoreError> {
        self.check_writable()?;
        self.doc.lock().config = *config;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn save_learned(&self, learned: &[StrategyId]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.doc.lock().learned = learned.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.save_config(&FailoverConfig::default()).is_err());
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        store.save_learned(&["a".into()]).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.snapshot().learned.len(), 1);
    }
}
