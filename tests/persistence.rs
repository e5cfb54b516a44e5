//! Controller restarts over a JSON state file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use strategy_failover::failover::{
    FailoverController, FailoverState, HealthOutcome, StrategyId, ThresholdSettings,
};
use strategy_failover::storage::JsonFileStore;

mod common;
use common::{id, RecordingGateway};

fn start(path: &Path, initial: Option<&str>) -> FailoverController {
    let store = Arc::new(JsonFileStore::open(path).unwrap());
    FailoverController::builder(RecordingGateway::new(), store)
        .initial_strategy(initial.map(StrategyId::from))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_config_and_learned_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failover-state.json");

    {
        let controller = start(&path, Some("A"));
        controller.set_enabled(true).unwrap();
        controller
            .set_config(ThresholdSettings {
                max_failures: 2,
                cooldown_secs: 45,
            })
            .unwrap();
        controller.report_success(&id("A"));
        controller.set_current_strategy(Some(id("B")));
        controller.report_success(&id("B"));
    }

    let controller = start(&path, Some("A"));
    let config = controller.get_config();
    assert!(config.enabled);
    assert_eq!(config.max_failures, 2);
    assert_eq!(config.cooldown_secs, 45);
    assert_eq!(controller.get_learned_strategies(), vec![id("A"), id("B")]);
    assert_eq!(controller.get_status().next_backup, Some(id("B")));
}

#[tokio::test]
async fn test_restart_is_a_cold_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failover-state.json");

    {
        let controller = start(&path, Some("A"));
        controller.set_enabled(true).unwrap();
        controller.report_success(&id("A"));
        controller.set_current_strategy(Some(id("B")));
        let outcome = controller.report_failure(&id("B"), "timeout").await.unwrap();
        assert_eq!(outcome, HealthOutcome::Recorded { failure_count: 1 });
    }

    let controller = start(&path, Some("B"));
    let status = controller.get_status();
    assert_eq!(status.state, FailoverState::Monitoring);
    assert_eq!(status.failure_count, 0);
    assert_eq!(status.cooldown_remaining_secs, 0);
    assert_eq!(status.last_failure_reason, None);
}

#[tokio::test]
async fn test_out_of_range_file_values_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failover-state.json");
    fs::write(
        &path,
        r#"{"config":{"enabled":true,"maxFailures":50,"cooldownSecs":5},"learned":["A","A","B"]}"#,
    )
    .unwrap();

    let controller = start(&path, None);
    let config = controller.get_config();
    assert!(config.enabled);
    assert_eq!(config.max_failures, 3);
    assert_eq!(config.cooldown_secs, 60);
    assert_eq!(controller.get_learned_strategies(), vec![id("A"), id("B")]);
}

#[tokio::test]
async fn test_corrupt_state_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failover-state.json");
    fs::write(&path, "{not json").unwrap();

    assert!(JsonFileStore::open(&path).is_err());
}
