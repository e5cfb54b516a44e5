//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the state store and restore the controller
//! - Build the gateway and catalog from configuration
//! - Start background tasks (catalog reload, metrics)
//! - Bind the admin listener last
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A cold start is never mid-cooldown

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin::{setup_admin_router, AppState};
use crate::catalog::StaticCatalog;
use crate::config::watcher::ConfigWatcher;
use crate::config::FailoverdConfig;
use crate::failover::{FailoverController, StrategyId};
use crate::gateway::CommandGateway;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::storage::{JsonFileStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("state store: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the controller and serve the admin API until a shutdown signal.
///
/// `config_path` enables catalog hot reload when the config came from a file.
pub async fn run(config: FailoverdConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(JsonFileStore::open(&config.storage.state_path)?);
    let gateway = Arc::new(CommandGateway::from_config(&config.gateway));
    let controller = Arc::new(
        FailoverController::builder(gateway, store)
            .activation_timeout(Duration::from_secs(config.controller.activation_timeout_secs))
            .initial_strategy(config.controller.initial_strategy.clone().map(StrategyId::from))
            .build()?,
    );
    let catalog = Arc::new(StaticCatalog::new(config.strategies.clone()));
    if catalog.is_empty() {
        tracing::warn!("Strategy catalog is empty, status will carry no strategy names");
    } else {
        tracing::info!(strategies = catalog.len(), "Strategy catalog loaded");
    }

    let shutdown = Shutdown::new();

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            match watcher.run(config.clone()) {
                Ok(handle) => {
                    tokio::spawn(apply_reloads(
                        config.clone(),
                        updates,
                        catalog.clone(),
                        shutdown.signal(),
                    ));
                    Some(handle)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let state = AppState {
        controller,
        catalog,
        api_key: Arc::from(config.admin.api_key.as_str()),
        degraded_below: config.controller.degraded_below,
    };
    let router = setup_admin_router(state);

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { signals::wait_for_signal(&shutdown).await }
    });

    let drain = shutdown.signal();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            drain.await;
            tracing::info!("Draining admin connections");
        })
        .await?;

    // Stops the reload task if the server exited on its own.
    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Apply reloaded configuration. Only the catalog is hot-swappable.
async fn apply_reloads(
    mut active: FailoverdConfig,
    mut updates: mpsc::UnboundedReceiver<FailoverdConfig>,
    catalog: Arc<StaticCatalog>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(next) = update else { break };
                if next.strategies != active.strategies {
                    catalog.replace(next.strategies.clone());
                }
                let restart_needed = next.admin != active.admin
                    || next.storage != active.storage
                    || next.gateway != active.gateway
                    || next.controller != active.controller
                    || next.observability != active.observability;
                if restart_needed {
                    tracing::warn!("Config changes outside [[strategies]] take effect after restart");
                }
                active = next;
            }
            _ = &mut shutdown => break,
        }
    }
}
