//! Metrics collection and exposition.
//!
//! # Metrics
//! - `failover_health_events_total` (counter): health signals by `kind`
//! - `failover_switches_total` (counter): confirmed switches by `trigger`
//! - `failover_activation_failures_total` (counter): gateway refusals/timeouts
//! - `failover_failure_count` (gauge): consecutive failures of the current strategy
//! - `failover_learned_strategies` (gauge): size of the learned list
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder the calls are no-ops, so tests need no setup
//! - The Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_health_event(kind: &'static str) {
    metrics::counter!("failover_health_events_total", "kind" => kind).increment(1);
}

pub fn record_switch(trigger: &'static str) {
    metrics::counter!("failover_switches_total", "trigger" => trigger).increment(1);
}

pub fn record_activation_failure() {
    metrics::counter!("failover_activation_failures_total").increment(1);
}

pub fn record_failure_count(count: u32) {
    metrics::gauge!("failover_failure_count").set(f64::from(count));
}

pub fn record_learned_count(count: usize) {
    metrics::gauge!("failover_learned_strategies").set(count as f64);
}
