//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use strategy_failover::failover::{
    FailoverConfig, FailoverController, ManualClock, StrategyId,
};
use strategy_failover::gateway::{ActivationError, ActivationGateway};
use strategy_failover::storage::{MemoryStore, PersistedFailover};

/// Gateway that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<StrategyId>>,
    reject: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Refuse every following activation with `message`.
    pub fn reject_with(&self, message: &str) {
        *self.reject.lock() = Some(message.to_string());
    }

    pub fn accept(&self) {
        *self.reject.lock() = None;
    }

    /// Sleep before answering.
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn clear_delay(&self) {
        *self.delay.lock() = None;
    }

    pub fn calls(&self) -> Vec<StrategyId> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ActivationGateway for RecordingGateway {
    async fn activate(&self, strategy: &StrategyId) -> Result<(), ActivationError> {
        self.calls.lock().push(strategy.clone());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let reject = self.reject.lock().clone();
        match reject {
            Some(message) => Err(ActivationError::Rejected(message)),
            None => Ok(()),
        }
    }
}

pub fn id(name: &str) -> StrategyId {
    StrategyId::from(name)
}

/// Everything a scenario needs to drive and inspect a controller.
pub struct Harness {
    pub controller: Arc<FailoverController>,
    pub gateway: Arc<RecordingGateway>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

/// Enabled controller with default thresholds, `current` live and `learned` as backups.
pub fn harness(current: &str, learned: &[&str]) -> Harness {
    harness_with(
        FailoverConfig {
            enabled: true,
            ..FailoverConfig::default()
        },
        Some(current),
        learned,
    )
}

pub fn harness_with(config: FailoverConfig, current: Option<&str>, learned: &[&str]) -> Harness {
    let gateway = RecordingGateway::new();
    let store = Arc::new(MemoryStore::with_state(PersistedFailover {
        config,
        learned: learned.iter().map(|n| id(n)).collect(),
    }));
    let clock = Arc::new(ManualClock::new());
    let controller = FailoverController::builder(gateway.clone(), store.clone())
        .clock(clock.clone())
        .initial_strategy(current.map(id))
        .build()
        .expect("memory store never fails to load");

    Harness {
        controller: Arc::new(controller),
        gateway,
        store,
        clock,
    }
}
