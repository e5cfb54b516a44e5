//! Core failover data model.
//!
//! # Types
//! - `StrategyId`: opaque identifier of a bypass strategy
//! - `FailoverConfig`: persisted policy (enabled, threshold, cooldown)
//! - `FailoverState`: the controller's state machine position
//! - `FailoverStatus`: read-only snapshot handed to status consumers

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::failover::error::ValidationError;

/// Allowed range for `FailoverConfig::max_failures`.
pub const MAX_FAILURES_RANGE: RangeInclusive<u32> = 1..=10;

/// Allowed range for `FailoverConfig::cooldown_secs`.
pub const COOLDOWN_SECS_RANGE: RangeInclusive<u32> = 10..=120;

/// Identifier of a strategy that can be made live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StrategyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for StrategyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Persisted failover policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailoverConfig {
    /// Master switch for automatic failover.
    pub enabled: bool,

    /// Consecutive failures before a switch is attempted.
    pub max_failures: u32,

    /// Seconds after an automatic switch during which no other automatic switch may happen.
    pub cooldown_secs: u32,
}

impl FailoverConfig {
    /// Check both numeric fields against their domains.
    ///
    /// Returns the first offending field; values are never clamped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !MAX_FAILURES_RANGE.contains(&self.max_failures) {
            return Err(ValidationError::MaxFailuresOutOfRange {
                value: self.max_failures,
                min: *MAX_FAILURES_RANGE.start(),
                max: *MAX_FAILURES_RANGE.end(),
            });
        }
        if !COOLDOWN_SECS_RANGE.contains(&self.cooldown_secs) {
            return Err(ValidationError::CooldownOutOfRange {
                value: self.cooldown_secs,
                min: *COOLDOWN_SECS_RANGE.start(),
                max: *COOLDOWN_SECS_RANGE.end(),
            });
        }
        Ok(())
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_failures: 3,
            cooldown_secs: 60,
        }
    }
}

/// Threshold/cooldown pair accepted by `set_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSettings {
    pub max_failures: u32,
    pub cooldown_secs: u32,
}

/// Position of the failover state machine.
///
/// # State Transitions
/// ```text
/// Disabled → Monitoring: enable (with a current strategy)
/// Monitoring → CountingFailures: first failure
/// CountingFailures → Monitoring: success
/// CountingFailures → Cooldown: threshold reached + confirmed activation
/// Cooldown → Monitoring | CountingFailures: deadline passed
/// any → Disabled: disable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailoverState {
    Disabled,
    Monitoring,
    CountingFailures,
    Cooldown,
}

impl fmt::Display for FailoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailoverState::Disabled => "disabled",
            FailoverState::Monitoring => "monitoring",
            FailoverState::CountingFailures => "counting_failures",
            FailoverState::Cooldown => "cooldown",
        };
        f.write_str(name)
    }
}

/// Why the last threshold breach did not produce a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwitchBlock {
    /// The learned list holds no strategy other than the current one.
    NoBackupAvailable,
    /// The activation gateway refused or timed out.
    ActivationFailed,
}

/// Snapshot of the controller, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailoverStatus {
    pub enabled: bool,
    pub state: FailoverState,
    pub failure_count: u32,
    pub max_failures: u32,
    pub cooldown_remaining_secs: u64,
    pub current_strategy: Option<StrategyId>,
    pub next_backup: Option<StrategyId>,
    pub last_failure_reason: Option<String>,
    pub switch_blocked: Option<SwitchBlock>,
}

/// Why a health signal was not applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IgnoreReason {
    /// Automatic failover is off.
    Disabled,
    /// The signal names a strategy that is no longer current.
    StaleStrategy,
    /// A switch is in flight; the signal was only recorded.
    SwitchPending,
}

/// Result of feeding a health signal to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "outcome")]
pub enum HealthOutcome {
    Ignored { reason: IgnoreReason },
    Recorded { failure_count: u32 },
    Switched { from: StrategyId, to: StrategyId },
}
