//! Concurrency-safe failover controller.
//!
//! # Responsibilities
//! - Serialize health signals and operator commands through one lock
//! - Drive switches through the activation gateway without holding the lock
//! - Persist config and learned strategies
//! - Publish notifications and metrics
//!
//! # Design Decisions
//! - One `parking_lot::Mutex` around `FailoverMachine`; it is never held
//!   across an `.await` and never held during store I/O
//! - Store writes are serialized by a second mutex, taken before the
//!   machine lock, never after
//! - Switch protocol: lock → decide (ticket) → unlock → activate →
//!   lock → commit or roll back
//! - A ticket whose driving future is dropped is abandoned, so the next
//!   failure can retry
//! - Cooldown is a stored deadline compared lazily; no timer task
//! - Disable cancels the in-flight activation by ticket id; a result that
//!   arrives after its ticket was superseded is dropped

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;

use crate::failover::clock::{Clock, SystemClock};
use crate::failover::error::{FailoverError, FailoverResult};
use crate::failover::events::{EventBus, FailoverEvent};
use crate::failover::learned::LearnedStrategies;
use crate::failover::machine::{
    CommitOutcome, FailoverMachine, FailureStep, SwitchTicket, SwitchTrigger,
};
use crate::failover::types::{
    FailoverConfig, FailoverState, FailoverStatus, HealthOutcome, StrategyId, ThresholdSettings,
};
use crate::gateway::{ActivationError, ActivationGateway};
use crate::observability::metrics;
use crate::storage::{FailoverStore, StoreError};

/// Default upper bound on a single activation.
pub const DEFAULT_ACTIVATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Superseded ticket ids buffered for in-flight activations.
const CANCEL_CAPACITY: usize = 16;

/// Assembles a `FailoverController` from its collaborators.
pub struct ControllerBuilder {
    gateway: Arc<dyn ActivationGateway>,
    store: Arc<dyn FailoverStore>,
    clock: Arc<dyn Clock>,
    activation_timeout: Duration,
    initial_strategy: Option<StrategyId>,
}

impl ControllerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn activation_timeout(mut self, timeout: Duration) -> Self {
        self.activation_timeout = timeout;
        self
    }

    /// Strategy already live when the controller starts.
    pub fn initial_strategy(mut self, strategy: Option<StrategyId>) -> Self {
        self.initial_strategy = strategy;
        self
    }

    /// Load persisted state and build the controller.
    ///
    /// Out-of-range thresholds in storage are replaced by defaults.
    pub fn build(self) -> Result<FailoverController, StoreError> {
        let persisted = self.store.load()?;

        let mut config = persisted.config;
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "Persisted failover config invalid, using defaults");
            config = FailoverConfig {
                enabled: config.enabled,
                ..FailoverConfig::default()
            };
        }

        let learned: LearnedStrategies = persisted.learned.into_iter().collect();
        metrics::record_learned_count(learned.len());

        let mut machine = FailoverMachine::new(config, learned);
        machine.set_current(self.initial_strategy);

        tracing::info!(
            enabled = config.enabled,
            max_failures = config.max_failures,
            cooldown_secs = config.cooldown_secs,
            learned = machine.learned().len(),
            "Failover controller ready"
        );

        let (cancel, _) = broadcast::channel(CANCEL_CAPACITY);
        Ok(FailoverController {
            machine: Mutex::new(machine),
            store_writes: Mutex::new(()),
            gateway: self.gateway,
            store: self.store,
            clock: self.clock,
            events: EventBus::new(),
            cancel,
            activation_timeout: self.activation_timeout,
        })
    }
}

/// Monitors the active strategy and switches to a learned backup on sustained failure.
pub struct FailoverController {
    machine: Mutex<FailoverMachine>,
    store_writes: Mutex<()>,
    gateway: Arc<dyn ActivationGateway>,
    store: Arc<dyn FailoverStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    cancel: broadcast::Sender<u64>,
    activation_timeout: Duration,
}

impl FailoverController {
    pub fn builder(
        gateway: Arc<dyn ActivationGateway>,
        store: Arc<dyn FailoverStore>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            gateway,
            store,
            clock: Arc::new(SystemClock),
            activation_timeout: DEFAULT_ACTIVATION_TIMEOUT,
            initial_strategy: None,
        }
    }

    // --- Queries ---

    /// Snapshot recomputed at call time.
    pub fn get_status(&self) -> FailoverStatus {
        let now = self.clock.now();
        self.machine.lock().status(now)
    }

    pub fn get_config(&self) -> FailoverConfig {
        self.machine.lock().config()
    }

    pub fn get_learned_strategies(&self) -> Vec<StrategyId> {
        self.machine.lock().learned().as_slice().to_vec()
    }

    pub fn state(&self) -> FailoverState {
        let now = self.clock.now();
        self.machine.lock().state_at(now)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FailoverEvent> {
        self.events.subscribe()
    }

    // --- Commands ---

    /// Turn automatic failover on or off. Disabling cancels a pending switch.
    pub fn set_enabled(&self, enabled: bool) -> FailoverResult<()> {
        let _writes = self.store_writes.lock();
        let mut config = self.machine.lock().config();
        if config.enabled != enabled {
            config.enabled = enabled;
            self.store.save_config(&config)?;
        }

        let superseded = self.machine.lock().set_enabled(enabled);
        if let Some(ticket) = superseded {
            let _ = self.cancel.send(ticket);
            tracing::info!(ticket, "Pending strategy switch cancelled by disable");
        }
        tracing::info!(enabled, "Auto failover status changed");
        Ok(())
    }

    /// Validate and persist new thresholds. All-or-nothing.
    pub fn set_config(&self, settings: ThresholdSettings) -> FailoverResult<()> {
        let _writes = self.store_writes.lock();
        let candidate = FailoverConfig {
            max_failures: settings.max_failures,
            cooldown_secs: settings.cooldown_secs,
            ..self.machine.lock().config()
        };
        candidate.validate()?;
        self.store.save_config(&candidate)?;
        self.machine.lock().apply_thresholds(settings);

        tracing::info!(
            max_failures = settings.max_failures,
            cooldown_secs = settings.cooldown_secs,
            "Failover config updated"
        );
        Ok(())
    }

    /// Clear the failure count if `expected` is still current.
    pub fn reset_state(&self, expected: &StrategyId) -> FailoverResult<()> {
        self.machine.lock().reset(expected)?;
        metrics::record_failure_count(0);
        tracing::debug!(strategy_id = %expected, "Failover state reset");
        Ok(())
    }

    /// Tell the controller which strategy the host made live on its own.
    pub fn set_current_strategy(&self, strategy: Option<StrategyId>) {
        let superseded = self.machine.lock().set_current(strategy.clone());
        if let Some(ticket) = superseded {
            let _ = self.cancel.send(ticket);
        }
        metrics::record_failure_count(0);
        match strategy {
            Some(id) => tracing::info!(strategy_id = %id, "Current strategy set"),
            None => tracing::info!("Current strategy cleared"),
        }
    }

    /// Switch to the next backup now, bypassing the threshold.
    ///
    /// Returns the activated strategy, or `None` if no backup is available.
    pub async fn trigger_manual_failover(&self) -> FailoverResult<Option<StrategyId>> {
        let ticket = self.machine.lock().begin_manual()?;
        let Some(ticket) = ticket else {
            tracing::info!("Manual failover: no backup strategy available");
            return Ok(None);
        };

        tracing::info!(
            current = ?ticket.from,
            backup = %ticket.to,
            "Manual failover triggered"
        );
        self.drive_switch(ticket).await.map(Some)
    }

    // --- Health signals ---

    pub fn report_success(&self, strategy: &StrategyId) -> HealthOutcome {
        metrics::record_health_event("success");
        let now = self.clock.now();

        let report = self.machine.lock().record_success(strategy, now);
        if report.learned {
            tracing::info!(strategy_id = %strategy, "Added to learned strategies");
            self.persist_learned();
        }

        match report.ignored {
            Some(reason) => HealthOutcome::Ignored { reason },
            None => {
                metrics::record_failure_count(0);
                HealthOutcome::Recorded { failure_count: 0 }
            }
        }
    }

    /// Feed a failure; may switch to a backup when the threshold is reached.
    pub async fn report_failure(
        &self,
        strategy: &StrategyId,
        reason: &str,
    ) -> FailoverResult<HealthOutcome> {
        metrics::record_health_event("failure");
        let now = self.clock.now();
        let (report, max_failures) = {
            let mut machine = self.machine.lock();
            let report = machine.record_failure(strategy, reason, now);
            (report, machine.config().max_failures)
        };

        if report.entered_degraded {
            self.events.publish(FailoverEvent::Degraded {
                strategy: strategy.clone(),
                reason: reason.to_string(),
            });
        }

        match report.step {
            FailureStep::Ignored(reason) => Ok(HealthOutcome::Ignored { reason }),
            FailureStep::Recorded { failure_count } => {
                metrics::record_failure_count(failure_count);
                tracing::warn!(
                    strategy_id = %strategy,
                    failure_count,
                    max_failures,
                    reason,
                    "Strategy failure recorded"
                );
                Ok(HealthOutcome::Recorded { failure_count })
            }
            FailureStep::NoBackup { failure_count } => {
                metrics::record_failure_count(failure_count);
                tracing::warn!(
                    strategy_id = %strategy,
                    failure_count,
                    "Failure threshold reached but no backup strategy is available"
                );
                Err(FailoverError::NoBackupAvailable)
            }
            FailureStep::Switch(ticket) => {
                metrics::record_failure_count(max_failures);
                tracing::info!(
                    current = %strategy,
                    backup = %ticket.to,
                    reason,
                    "Auto-failover triggered"
                );
                let from = strategy.clone();
                let to = self.drive_switch(ticket).await?;
                Ok(HealthOutcome::Switched { from, to })
            }
        }
    }

    /// Write the learned list outside the machine lock.
    ///
    /// The list only grows, so a snapshot taken after acquiring the write
    /// lock is never older than what is already on disk.
    fn persist_learned(&self) {
        let _writes = self.store_writes.lock();
        let learned = self.machine.lock().learned().as_slice().to_vec();
        metrics::record_learned_count(learned.len());
        if let Err(e) = self.store.save_learned(&learned) {
            tracing::warn!(error = %e, "Failed to persist learned strategies");
        }
    }

    // --- Switching ---

    /// Run the gateway for `ticket` outside the lock, then commit or roll back.
    async fn drive_switch(&self, ticket: SwitchTicket) -> FailoverResult<StrategyId> {
        let _pending = PendingSwitch {
            machine: &self.machine,
            ticket: &ticket,
        };
        let mut superseded = self.cancel.subscribe();
        let activation = time::timeout(self.activation_timeout, self.gateway.activate(&ticket.to));
        tokio::pin!(activation);

        let outcome = loop {
            tokio::select! {
                res = &mut activation => break res,
                cancelled = superseded.recv() => match cancelled {
                    Ok(id) if id == ticket.id => {
                        tracing::info!(backup = %ticket.to, "Activation cancelled");
                        return Err(FailoverError::Cancelled);
                    }
                    // Another ticket, or missed ids; commit_switch still rejects a superseded ticket.
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break (&mut activation).await,
                },
            }
        };
        let result = match outcome {
            Ok(res) => res,
            Err(_) => Err(ActivationError::Timeout(self.activation_timeout.as_secs())),
        };

        let now = self.clock.now();
        match result {
            Ok(()) => {
                let outcome = self.machine.lock().commit_switch(&ticket, now);
                match outcome {
                    CommitOutcome::Committed { from, to } => {
                        metrics::record_switch(ticket.trigger.as_str());
                        metrics::record_failure_count(0);
                        tracing::info!(
                            from = ?from,
                            to = %to,
                            trigger = ticket.trigger.as_str(),
                            "Switched to backup strategy"
                        );
                        self.events.publish(FailoverEvent::Switched {
                            from,
                            to: to.clone(),
                            manual: ticket.trigger == SwitchTrigger::Manual,
                        });
                        Ok(to)
                    }
                    CommitOutcome::Discarded => {
                        tracing::warn!(
                            backup = %ticket.to,
                            "Activation finished after the switch was superseded, result dropped"
                        );
                        Err(FailoverError::Cancelled)
                    }
                }
            }
            Err(source) => {
                let message = format!("activation of {} failed: {}", ticket.to, source);
                let applied = self.machine.lock().fail_switch(&ticket, &message);
                metrics::record_activation_failure();
                if applied {
                    tracing::warn!(
                        backup = %ticket.to,
                        error = %source,
                        "Failed to activate backup strategy"
                    );
                    self.events.publish(FailoverEvent::SwitchFailed {
                        target: ticket.to.clone(),
                        error: source.to_string(),
                    });
                }
                Err(FailoverError::Activation {
                    strategy: ticket.to.clone(),
                    source,
                })
            }
        }
    }
}

/// Abandons the ticket if the future driving it is dropped before the
/// gateway answers. A committed, failed or superseded ticket is no longer
/// pending, so the rollback is then a no-op.
struct PendingSwitch<'a> {
    machine: &'a Mutex<FailoverMachine>,
    ticket: &'a SwitchTicket,
}

impl Drop for PendingSwitch<'_> {
    fn drop(&mut self) {
        if self.machine.lock().abandon(self.ticket) {
            tracing::warn!(
                backup = %self.ticket.to,
                "Strategy switch abandoned before the gateway answered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failover::clock::ManualClock;
    use crate::storage::{FailoverStore, MemoryStore, PersistedFailover, StoreError};
    use async_trait::async_trait;
    use std::sync::Weak;

    struct AlwaysOk;

    #[async_trait]
    impl ActivationGateway for AlwaysOk {
        async fn activate(&self, _strategy: &StrategyId) -> Result<(), ActivationError> {
            Ok(())
        }
    }

    struct Hangs;

    #[async_trait]
    impl ActivationGateway for Hangs {
        async fn activate(&self, _strategy: &StrategyId) -> Result<(), ActivationError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl ActivationGateway for Slow {
        async fn activate(&self, _strategy: &StrategyId) -> Result<(), ActivationError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    /// Records whether the machine lock was held during each write.
    struct LockWatchingStore {
        inner: MemoryStore,
        controller: Mutex<Weak<FailoverController>>,
        held_during_write: Mutex<Vec<bool>>,
    }

    impl LockWatchingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                controller: Mutex::new(Weak::new()),
                held_during_write: Mutex::new(Vec::new()),
            }
        }

        fn note(&self) {
            let controller = self.controller.lock().upgrade();
            if let Some(controller) = controller {
                let held = controller.machine.try_lock().is_none();
                self.held_during_write.lock().push(held);
            }
        }
    }

    impl FailoverStore for LockWatchingStore {
        fn load(&self) -> Result<PersistedFailover, StoreError> {
            self.inner.load()
        }

        fn save_config(&self, config: &FailoverConfig) -> Result<(), StoreError> {
            self.note();
            self.inner.save_config(config)
        }

        fn save_learned(&self, learned: &[StrategyId]) -> Result<(), StoreError> {
            self.note();
            self.inner.save_learned(learned)
        }
    }

    fn persisted(enabled: bool, learned: &[&str]) -> PersistedFailover {
        PersistedFailover {
            config: FailoverConfig {
                enabled,
                ..FailoverConfig::default()
            },
            learned: learned.iter().map(|s| StrategyId::from(*s)).collect(),
        }
    }

    #[test]
    fn test_build_replaces_invalid_persisted_config() {
        let store = Arc::new(MemoryStore::with_state(PersistedFailover {
            config: FailoverConfig {
                enabled: true,
                max_failures: 0,
                cooldown_secs: 5,
            },
            learned: vec!["a".into(), "a".into()],
        }));
        let controller = FailoverController::builder(Arc::new(AlwaysOk), store)
            .build()
            .unwrap();

        let config = controller.get_config();
        assert!(config.enabled);
        assert_eq!(config.max_failures, 3);
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(controller.get_learned_strategies(), vec![StrategyId::from("a")]);
    }

    #[test]
    fn test_set_config_storage_failure_is_atomic() {
        let store = Arc::new(MemoryStore::new());
        let controller = FailoverController::builder(Arc::new(AlwaysOk), store.clone())
            .build()
            .unwrap();

        store.set_fail_writes(true);
        let err = controller
            .set_config(ThresholdSettings {
                max_failures: 5,
                cooldown_secs: 30,
            })
            .unwrap_err();
        assert!(matches!(err, FailoverError::Storage(_)));
        assert_eq!(controller.get_config(), FailoverConfig::default());
    }

    #[test]
    fn test_store_writes_run_outside_machine_lock() {
        let store = Arc::new(LockWatchingStore::new());
        let controller = Arc::new(
            FailoverController::builder(Arc::new(AlwaysOk), store.clone())
                .initial_strategy(Some("a".into()))
                .build()
                .unwrap(),
        );
        *store.controller.lock() = Arc::downgrade(&controller);

        controller.set_enabled(true).unwrap();
        controller
            .set_config(ThresholdSettings {
                max_failures: 5,
                cooldown_secs: 30,
            })
            .unwrap();
        controller.report_success(&"a".into());

        assert_eq!(*store.held_during_write.lock(), vec![false, false, false]);
        let saved = store.inner.snapshot();
        assert!(saved.config.enabled);
        assert_eq!(saved.config.max_failures, 5);
        assert_eq!(saved.learned, vec![StrategyId::from("a")]);
    }

    #[tokio::test]
    async fn test_activation_timeout_is_a_failure() {
        let store = Arc::new(MemoryStore::with_state(persisted(true, &["a", "b"])));
        let controller = FailoverController::builder(Arc::new(Hangs), store)
            .clock(Arc::new(ManualClock::new()))
            .activation_timeout(Duration::from_millis(50))
            .initial_strategy(Some("a".into()))
            .build()
            .unwrap();

        let err = controller.trigger_manual_failover().await.unwrap_err();
        match err {
            FailoverError::Activation { strategy, source } => {
                assert_eq!(strategy, StrategyId::from("b"));
                assert!(matches!(source, ActivationError::Timeout(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(controller.get_status().current_strategy, Some("a".into()));
    }

    #[tokio::test]
    async fn test_disable_cancels_inflight_activation() {
        let store = Arc::new(MemoryStore::with_state(persisted(true, &["a", "b"])));
        let controller = Arc::new(
            FailoverController::builder(Arc::new(Hangs), store)
                .clock(Arc::new(ManualClock::new()))
                .initial_strategy(Some("a".into()))
                .build()
                .unwrap(),
        );

        let c = controller.clone();
        let task = tokio::spawn(async move { c.trigger_manual_failover().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        controller.set_enabled(false).unwrap();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(FailoverError::Cancelled)));

        let status = controller.get_status();
        assert_eq!(status.current_strategy, Some("a".into()));
        assert_eq!(status.state, FailoverState::Disabled);
    }

    #[tokio::test]
    async fn test_dropped_switch_releases_ticket() {
        let store = Arc::new(MemoryStore::with_state(persisted(true, &["a", "b"])));
        let controller = FailoverController::builder(Arc::new(Hangs), store)
            .clock(Arc::new(ManualClock::new()))
            .initial_strategy(Some("a".into()))
            .build()
            .unwrap();

        let dropped =
            tokio::time::timeout(Duration::from_millis(50), controller.trigger_manual_failover())
                .await;
        assert!(dropped.is_err());
        assert!(!controller.machine.lock().has_pending_switch());

        // A new ticket is issued rather than SwitchInProgress.
        let again =
            tokio::time::timeout(Duration::from_millis(50), controller.trigger_manual_failover())
                .await;
        assert!(again.is_err());
        assert_eq!(controller.get_status().current_strategy, Some("a".into()));
    }

    #[tokio::test]
    async fn test_cancel_for_other_ticket_is_ignored() {
        let store = Arc::new(MemoryStore::with_state(persisted(true, &["a", "b"])));
        let controller = Arc::new(
            FailoverController::builder(Arc::new(Slow(Duration::from_millis(100))), store)
                .clock(Arc::new(ManualClock::new()))
                .initial_strategy(Some("a".into()))
                .build()
                .unwrap(),
        );

        let c = controller.clone();
        let task = tokio::spawn(async move { c.trigger_manual_failover().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let _ = controller.cancel.send(u64::MAX);
        let result = task.await.unwrap();
        assert_eq!(result.unwrap(), Some(StrategyId::from("b")));
        assert_eq!(controller.get_status().current_strategy, Some("b".into()));
    }
}
