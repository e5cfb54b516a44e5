//! JSON file store.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::failover::types::{FailoverConfig, StrategyId};
use crate::storage::{FailoverStore, PersistedFailover, StoreError};

/// Keeps the whole document in memory and rewrites the file on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    doc: Mutex<PersistedFailover>,
}

impl JsonFileStore {
    /// Open the store, reading the file if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let doc: PersistedFailover = serde_json::from_reader(reader)?;
            tracing::info!(
                path = %path.display(),
                learned = doc.learned.len(),
                "Loaded failover state"
            );
            doc
        } else {
            tracing::info!(path = %path.display(), "No failover state file, starting fresh");
            PersistedFailover::default()
        };

        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    /// Write to a sibling temp file and rename over the target.
    fn write(&self, doc: &PersistedFailover) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, doc)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FailoverStore for JsonFileStore {
    fn load(&self) -> Result<PersistedFailover, StoreError> {
        Ok(self.doc.lock().clone())
    }

    fn save_config(&self, config: &FailoverConfig) -> Result<(), StoreError> {
        let mut doc = self.doc.lock();
        let mut next = doc.clone();
        next.config = *config;
        self.write(&next)?;
        *doc = next;
        tracing::debug!(path = %self.path.display(), "Saved failover config");
        Ok(())
    }

    fn save_learned(&self, learned: &[StrategyId]) -> Result<(), StoreError> {
        let mut doc = self.doc.lock();
        let mut next = doc.clone();
        next.learned = learned.to_vec();
        self.write(&next)?;
        *doc = next;
        tracing::debug!(count = learned.len(), "Saved learned strategies");
        Ok(())
    }
}
