//! Failover state machine.
//!
//! Holds every field guarded by the controller's exclusive region and
//! implements the transitions synchronously. It never performs I/O and
//! never reads the clock itself; callers pass `now`.
//!
//! # Switch protocol
//! ```text
//! record_failure / begin_manual  → SwitchTicket (pending)
//!     gateway call happens outside the lock
//! commit_switch(ticket)          → current := ticket.to
//! fail_switch(ticket, error)     → stay, surface error
//! abandon(ticket)                → stay, caller went away
//! ```
//! A ticket is only honoured while it is still the pending one; disable
//! and `set_current` clear it so late results are dropped. Both report the
//! id of the ticket they superseded so only that activation is cancelled.

use std::time::{Duration, Instant};

use crate::failover::error::FailoverError;
use crate::failover::learned::LearnedStrategies;
use crate::failover::types::{
    FailoverConfig, FailoverState, FailoverStatus, IgnoreReason, StrategyId, SwitchBlock,
    ThresholdSettings,
};

/// What started a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTrigger {
    /// Failure threshold reached.
    Automatic,
    /// Operator command.
    Manual,
}

impl SwitchTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchTrigger::Automatic => "automatic",
            SwitchTrigger::Manual => "manual",
        }
    }
}

/// A switch decided under the lock and awaiting the gateway's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTicket {
    pub id: u64,
    pub from: Option<StrategyId>,
    pub to: StrategyId,
    pub trigger: SwitchTrigger,
}

/// Effect of a failure signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureStep {
    Ignored(IgnoreReason),
    Recorded { failure_count: u32 },
    /// Threshold reached but nothing to switch to.
    NoBackup { failure_count: u32 },
    /// Threshold reached; the caller must drive the ticket through the gateway.
    Switch(SwitchTicket),
}

/// A failure step plus whether it opened a new degradation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub step: FailureStep,
    pub entered_degraded: bool,
}

/// Effect of a success signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessReport {
    pub ignored: Option<IgnoreReason>,
    /// True when the strategy was appended to the learned list.
    pub learned: bool,
}

/// Result of committing a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        from: Option<StrategyId>,
        to: StrategyId,
    },
    /// The ticket was superseded (disable, new current strategy).
    Discarded,
}

#[derive(Debug)]
pub struct FailoverMachine {
    config: FailoverConfig,
    state: FailoverState,
    failure_count: u32,
    current: Option<StrategyId>,
    last_failure_reason: Option<String>,
    switch_blocked: Option<SwitchBlock>,
    cooldown_until: Option<Instant>,
    learned: LearnedStrategies,
    pending: Option<SwitchTicket>,
    next_ticket: u64,
}

impl FailoverMachine {
    /// Cold start: never mid-cooldown, count at zero, no current strategy.
    pub fn new(config: FailoverConfig, learned: LearnedStrategies) -> Self {
        Self {
            config,
            state: FailoverState::Disabled,
            failure_count: 0,
            current: None,
            last_failure_reason: None,
            switch_blocked: None,
            cooldown_until: None,
            learned,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn config(&self) -> FailoverConfig {
        self.config
    }

    pub fn current(&self) -> Option<&StrategyId> {
        self.current.as_ref()
    }

    pub fn learned(&self) -> &LearnedStrategies {
        &self.learned
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn has_pending_switch(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_backup(&self) -> Option<&StrategyId> {
        self.learned.next_backup(self.current.as_ref())
    }

    /// State as observed at `now`, folding in an elapsed cooldown.
    pub fn state_at(&self, now: Instant) -> FailoverState {
        match (self.state, self.cooldown_until) {
            (FailoverState::Cooldown, Some(deadline)) if now >= deadline => self.after_cooldown(),
            (state, _) => state,
        }
    }

    fn after_cooldown(&self) -> FailoverState {
        if self.failure_count > 0 {
            FailoverState::CountingFailures
        } else {
            FailoverState::Monitoring
        }
    }

    /// Time left in the cooldown at `now`.
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match (self.state, self.cooldown_until) {
            (FailoverState::Cooldown, Some(deadline)) => deadline.saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    /// Apply a cooldown expiry lazily.
    fn expire_cooldown(&mut self, now: Instant) {
        let observed = self.state_at(now);
        if observed != self.state {
            tracing::debug!(state = %observed, "Cooldown elapsed");
            self.state = observed;
            self.cooldown_until = None;
        }
    }

    pub fn status(&self, now: Instant) -> FailoverStatus {
        FailoverStatus {
            enabled: self.config.enabled,
            state: self.state_at(now),
            failure_count: self.failure_count,
            max_failures: self.config.max_failures,
            cooldown_remaining_secs: ceil_secs(self.cooldown_remaining(now)),
            current_strategy: self.current.clone(),
            next_backup: self.next_backup().cloned(),
            last_failure_reason: self.last_failure_reason.clone(),
            switch_blocked: self.switch_blocked,
        }
    }

    // --- Commands ---

    /// Toggle the master switch. Returns the id of a pending ticket it superseded.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<u64> {
        self.config.enabled = enabled;
        if enabled {
            if self.state == FailoverState::Disabled && self.current.is_some() {
                self.state = FailoverState::Monitoring;
                self.failure_count = 0;
                self.switch_blocked = None;
            }
            None
        } else {
            self.state = FailoverState::Disabled;
            self.failure_count = 0;
            self.switch_blocked = None;
            self.cooldown_until = None;
            self.pending.take().map(|t| t.id)
        }
    }

    /// Replace thresholds. Applies prospectively; an in-flight cooldown keeps its deadline.
    pub fn apply_thresholds(&mut self, settings: ThresholdSettings) {
        self.config.max_failures = settings.max_failures;
        self.config.cooldown_secs = settings.cooldown_secs;
    }

    /// Record the strategy the host made live on its own.
    ///
    /// Returns the id of a pending ticket it superseded.
    pub fn set_current(&mut self, current: Option<StrategyId>) -> Option<u64> {
        self.state = if self.config.enabled && current.is_some() {
            FailoverState::Monitoring
        } else {
            FailoverState::Disabled
        };
        self.current = current;
        self.failure_count = 0;
        self.last_failure_reason = None;
        self.switch_blocked = None;
        self.cooldown_until = None;
        self.pending.take().map(|t| t.id)
    }

    /// Clear the failure window if `expected` is still the current strategy.
    pub fn reset(&mut self, expected: &StrategyId) -> Result<(), FailoverError> {
        if self.current.as_ref() != Some(expected) {
            return Err(FailoverError::StaleState {
                expected: expected.clone(),
                actual: self.current.clone(),
            });
        }
        self.failure_count = 0;
        self.switch_blocked = None;
        Ok(())
    }

    // --- Health signals ---

    pub fn record_success(&mut self, id: &StrategyId, now: Instant) -> SuccessReport {
        if self.current.as_ref() != Some(id) {
            return SuccessReport {
                ignored: Some(IgnoreReason::StaleStrategy),
                learned: false,
            };
        }

        let learned = self.learned.learn(id);

        if self.state == FailoverState::Disabled {
            return SuccessReport {
                ignored: Some(IgnoreReason::Disabled),
                learned,
            };
        }

        self.expire_cooldown(now);
        if self.failure_count > 0 {
            tracing::debug!(
                strategy_id = %id,
                previous_failures = self.failure_count,
                "Strategy success - resetting failure count"
            );
        }
        self.failure_count = 0;
        self.switch_blocked = None;
        if self.state == FailoverState::CountingFailures {
            self.state = FailoverState::Monitoring;
        }

        SuccessReport {
            ignored: None,
            learned,
        }
    }

    pub fn record_failure(&mut self, id: &StrategyId, reason: &str, now: Instant) -> FailureReport {
        if self.current.as_ref() != Some(id) {
            return FailureReport {
                step: FailureStep::Ignored(IgnoreReason::StaleStrategy),
                entered_degraded: false,
            };
        }
        if self.state == FailoverState::Disabled {
            return FailureReport {
                step: FailureStep::Ignored(IgnoreReason::Disabled),
                entered_degraded: false,
            };
        }

        self.expire_cooldown(now);
        self.last_failure_reason = Some(reason.to_string());
        let max = self.config.max_failures;
        self.failure_count = self.failure_count.saturating_add(1).min(max);
        let failure_count = self.failure_count;

        if self.state == FailoverState::Cooldown {
            return FailureReport {
                step: FailureStep::Recorded { failure_count },
                entered_degraded: false,
            };
        }

        let entered_degraded = self.state == FailoverState::Monitoring;
        self.state = FailoverState::CountingFailures;

        if self.pending.is_some() {
            return FailureReport {
                step: FailureStep::Ignored(IgnoreReason::SwitchPending),
                entered_degraded,
            };
        }

        if failure_count < max {
            return FailureReport {
                step: FailureStep::Recorded { failure_count },
                entered_degraded,
            };
        }

        let step = match self.next_backup().cloned() {
            Some(to) => FailureStep::Switch(self.issue_ticket(to, SwitchTrigger::Automatic)),
            None => {
                self.switch_blocked = Some(SwitchBlock::NoBackupAvailable);
                FailureStep::NoBackup { failure_count }
            }
        };
        FailureReport {
            step,
            entered_degraded,
        }
    }

    // --- Switching ---

    /// Start an operator-requested switch. `Ok(None)` when no backup exists.
    pub fn begin_manual(&mut self) -> Result<Option<SwitchTicket>, FailoverError> {
        if self.pending.is_some() {
            return Err(FailoverError::SwitchInProgress);
        }
        match self.next_backup().cloned() {
            Some(to) => Ok(Some(self.issue_ticket(to, SwitchTrigger::Manual))),
            None => Ok(None),
        }
    }

    fn issue_ticket(&mut self, to: StrategyId, trigger: SwitchTrigger) -> SwitchTicket {
        let ticket = SwitchTicket {
            id: self.next_ticket,
            from: self.current.clone(),
            to,
            trigger,
        };
        self.next_ticket += 1;
        self.pending = Some(ticket.clone());
        ticket
    }

    fn take_pending(&mut self, ticket: &SwitchTicket) -> bool {
        match &self.pending {
            Some(pending) if pending.id == ticket.id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Make the ticket's target current after a confirmed activation.
    pub fn commit_switch(&mut self, ticket: &SwitchTicket, now: Instant) -> CommitOutcome {
        if !self.take_pending(ticket) {
            return CommitOutcome::Discarded;
        }

        self.expire_cooldown(now);
        self.current = Some(ticket.to.clone());
        self.failure_count = 0;
        self.switch_blocked = None;

        match ticket.trigger {
            SwitchTrigger::Automatic => {
                let cooldown = Duration::from_secs(u64::from(self.config.cooldown_secs));
                self.cooldown_until = Some(now + cooldown);
                self.state = FailoverState::Cooldown;
            }
            SwitchTrigger::Manual => {
                // No new cooldown; an existing one keeps running.
                if !self.config.enabled {
                    self.state = FailoverState::Disabled;
                } else if self.state != FailoverState::Cooldown {
                    self.state = FailoverState::Monitoring;
                }
            }
        }

        CommitOutcome::Committed {
            from: ticket.from.clone(),
            to: ticket.to.clone(),
        }
    }

    /// Record a failed activation. Returns false if the ticket was superseded.
    pub fn fail_switch(&mut self, ticket: &SwitchTicket, error: &str) -> bool {
        if !self.take_pending(ticket) {
            return false;
        }
        self.last_failure_reason = Some(error.to_string());
        self.switch_blocked = Some(SwitchBlock::ActivationFailed);
        if ticket.trigger == SwitchTrigger::Automatic {
            self.failure_count = self.config.max_failures;
            self.state = FailoverState::CountingFailures;
        }
        true
    }

    /// Drop a ticket whose activation will never report back.
    ///
    /// The failure count is left as is, so an automatic switch is retried on
    /// the next failure. Returns false if the ticket was no longer pending.
    pub fn abandon(&mut self, ticket: &SwitchTicket) -> bool {
        if !self.take_pending(ticket) {
            return false;
        }
        tracing::debug!(ticket = ticket.id, backup = %ticket.to, "Switch abandoned");
        true
    }
}

/// Whole seconds, rounded up.
fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
