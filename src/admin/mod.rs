//! Admin HTTP surface.
//!
//! Exposes controller queries and commands, plus health-signal
//! ingestion for an external probing loop. Every route requires the
//! bearer API key.

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::catalog::StrategyCatalog;
use crate::failover::FailoverController;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FailoverController>,
    pub catalog: Arc<dyn StrategyCatalog>,
    pub api_key: Arc<str>,
    pub degraded_below: f64,
}

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_system_status))
        .route("/failover/status", get(get_status))
        .route("/failover/config", get(get_config).put(put_config))
        .route("/failover/enabled", put(put_enabled))
        .route("/failover/manual", post(post_manual_failover))
        .route("/failover/reset", post(post_reset))
        .route("/failover/learned", get(get_learned))
        .route("/failover/current", put(put_current))
        .route("/health/success", post(post_health_success))
        .route("/health/failure", post(post_health_failure))
        .route("/health/probe", post(post_health_probe))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
