use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::error::ApiError;
use crate::admin::AppState;
use crate::failover::{
    FailoverConfig, FailoverStatus, HealthOutcome, StrategyId, ThresholdSettings,
};
use crate::health::ProbeVerdict;

#[derive(Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

/// Failover status enriched with catalog names.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    #[serde(flatten)]
    pub status: FailoverStatus,
    pub current_strategy_name: Option<String>,
    pub next_backup_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    pub strategy_id: StrategyId,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRequest {
    pub strategy_id: Option<StrategyId>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRequest {
    pub strategy_id: StrategyId,
    pub reason: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub strategy_id: StrategyId,
    pub accessible: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize)]
pub struct ProbeResponse {
    pub verdict: ProbeVerdict,
    pub outcome: Option<HealthOutcome>,
}

#[derive(Serialize, Deserialize)]
pub struct ManualFailoverResponse {
    pub activated: Option<StrategyId>,
}

pub async fn get_system_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusView> {
    let status = state.controller.get_status();
    let name_of = |id: &Option<StrategyId>| {
        id.as_ref()
            .and_then(|id| state.catalog.resolve(id))
            .map(|meta| meta.name)
    };
    Json(StatusView {
        current_strategy_name: name_of(&status.current_strategy),
        next_backup_name: name_of(&status.next_backup),
        status,
    })
}

pub async fn get_config(State(state): State<AppState>) -> Json<FailoverConfig> {
    Json(state.controller.get_config())
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(settings): Json<ThresholdSettings>,
) -> Result<Json<FailoverConfig>, ApiError> {
    state.controller.set_config(settings)?;
    Ok(Json(state.controller.get_config()))
}

pub async fn put_enabled(
    State(state): State<AppState>,
    Json(req): Json<EnabledRequest>,
) -> Result<Json<FailoverConfig>, ApiError> {
    state.controller.set_enabled(req.enabled)?;
    Ok(Json(state.controller.get_config()))
}

pub async fn post_manual_failover(
    State(state): State<AppState>,
) -> Result<Json<ManualFailoverResponse>, ApiError> {
    let activated = state.controller.trigger_manual_failover().await?;
    Ok(Json(ManualFailoverResponse { activated }))
}

pub async fn post_reset(
    State(state): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Result<StatusCode, ApiError> {
    state.controller.reset_state(&req.strategy_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_learned(State(state): State<AppState>) -> Json<Vec<StrategyId>> {
    Json(state.controller.get_learned_strategies())
}

pub async fn put_current(
    State(state): State<AppState>,
    Json(req): Json<CurrentRequest>,
) -> StatusCode {
    state.controller.set_current_strategy(req.strategy_id);
    StatusCode::NO_CONTENT
}

pub async fn post_health_success(
    State(state): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Json<HealthOutcome> {
    Json(state.controller.report_success(&req.strategy_id))
}

pub async fn post_health_failure(
    State(state): State<AppState>,
    Json(req): Json<FailureRequest>,
) -> Result<Json<HealthOutcome>, ApiError> {
    let outcome = state
        .controller
        .report_failure(&req.strategy_id, &req.reason)
        .await?;
    Ok(Json(outcome))
}

pub async fn post_health_probe(
    State(state): State<AppState>,
    Json(req): Json<ProbeRequest>,
) -> Result<Json<ProbeResponse>, ApiError> {
    let verdict = ProbeVerdict::evaluate(req.accessible, req.total, state.degraded_below);
    let outcome = match &verdict {
        ProbeVerdict::Healthy => Some(state.controller.report_success(&req.strategy_id)),
        ProbeVerdict::Degraded { reason } => Some(
            state
                .controller
                .report_failure(&req.strategy_id, reason)
                .await?,
        ),
        ProbeVerdict::Inconclusive => None,
    };
    Ok(Json(ProbeResponse { verdict, outcome }))
}
