//! Turns a round of service probes into a health signal.

use serde::{Deserialize, Serialize};

/// Default share of reachable services below which a strategy counts as degraded.
pub const DEFAULT_DEGRADED_BELOW: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "verdict")]
pub enum ProbeVerdict {
    Healthy,
    Degraded { reason: String },
    /// Nothing was probed.
    Inconclusive,
}

impl ProbeVerdict {
    /// Degraded when `accessible / total < degraded_below`.
    pub fn evaluate(accessible: usize, total: usize, degraded_below: f64) -> Self {
        if total == 0 {
            return ProbeVerdict::Inconclusive;
        }
        let accessible = accessible.min(total);
        let rate = accessible as f64 / total as f64;
        if rate < degraded_below {
            ProbeVerdict::Degraded {
                reason: format!(
                    "service degradation: {}/{} services accessible ({:.0}%)",
                    accessible,
                    total,
                    rate * 100.0
                ),
            }
        } else {
            ProbeVerdict::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        assert_eq!(
            ProbeVerdict::evaluate(0, 0, DEFAULT_DEGRADED_BELOW),
            ProbeVerdict::Inconclusive
        );
        assert_eq!(
            ProbeVerdict::evaluate(5, 10, DEFAULT_DEGRADED_BELOW),
            ProbeVerdict::Healthy
        );
        assert_eq!(
            ProbeVerdict::evaluate(1, 4, DEFAULT_DEGRADED_BELOW),
            ProbeVerdict::Degraded {
                reason: "service degradation: 1/4 services accessible (25%)".into()
            }
        );
    }

    #[test]
    fn test_accessible_clamped_to_total() {
        assert_eq!(ProbeVerdict::evaluate(9, 3, 1.0), ProbeVerdict::Healthy);
    }
}
