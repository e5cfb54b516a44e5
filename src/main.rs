//! failoverd: strategy failover daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     Probe loop / operator          ┌──────────────────────────────────────────────┐
//!     ───────────────────────────────┼─▶ admin API (axum, bearer auth)              │
//!                                    │        │                                     │
//!                                    │        ▼                                     │
//!                                    │  FailoverController ──▶ state store (JSON)   │
//!                                    │        │                                     │
//!                                    │        ▼                                     │
//!                                    │  ActivationGateway ──▶ apply command ────────┼──▶ live strategy
//!                                    │                                              │
//!                                    │  config watcher ──▶ strategy catalog         │
//!                                    │  tracing + Prometheus metrics                │
//!                                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use strategy_failover::config::{load_config, FailoverdConfig};
use strategy_failover::lifecycle::startup;
use strategy_failover::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "failoverd")]
#[command(about = "Automatic strategy failover daemon", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => FailoverdConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "failoverd starting");
    tracing::info!(
        admin_address = %config.admin.bind_address,
        state_path = %config.storage.state_path,
        gateway = %config.gateway.program,
        strategies = config.strategies.len(),
        "Configuration loaded"
    );

    startup::run(config, args.config).await?;
    Ok(())
}
