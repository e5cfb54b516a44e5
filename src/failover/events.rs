//! Failover notifications.
//!
//! Fire-and-forget broadcast for observers (UI, logs). Nothing in the
//! controller depends on an event being delivered; lagging receivers
//! simply miss events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::failover::types::StrategyId;

/// Capacity of the broadcast buffer.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FailoverEvent {
    /// The current strategy left `Monitoring` after its first failure.
    Degraded { strategy: StrategyId, reason: String },
    /// A backup was made live.
    Switched {
        from: Option<StrategyId>,
        to: StrategyId,
        manual: bool,
    },
    /// The gateway refused a backup.
    SwitchFailed { target: StrategyId, error: String },
}

/// Broadcast hub for `FailoverEvent`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FailoverEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FailoverEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers; no subscribers is not an error.
    pub fn publish(&self, event: FailoverEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(FailoverEvent::Degraded {
            strategy: "a".into(),
            reason: "timeout".into(),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, FailoverEvent::Degraded { .. }));
    }

    #[test]
    fn test_publish_without_subscribers() {
        EventBus::new().publish(FailoverEvent::SwitchFailed {
            target: "b".into(),
            error: "boom".into(),
        });
    }
}
