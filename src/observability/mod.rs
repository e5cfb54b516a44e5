//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! controller, gateway, store, admin API
//!     → logging.rs (tracing subscriber: pretty or JSON to stdout)
//!     → metrics.rs (failover counters and gauges)
//!
//! Prometheus scrapes the exporter when `metrics_enabled` is set.
//! ```

pub mod logging;
pub mod metrics;
