//! Configuration schema definitions.
//!
//! This module defines the daemon configuration file. Failover policy
//! itself (`FailoverConfig`) is not here: it lives in the state store
//! and changes only through the configuration command.

use serde::{Deserialize, Serialize};

use crate::catalog::StrategyMeta;
use crate::health::verdict::DEFAULT_DEGRADED_BELOW;

/// Root configuration for the failover daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FailoverdConfig {
    /// Admin API listener and credentials.
    pub admin: AdminConfig,

    /// Where persisted failover state lives.
    pub storage: StorageConfig,

    /// How a strategy is made live.
    pub gateway: GatewayConfig,

    /// Controller runtime settings.
    pub controller: ControllerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Strategy catalog (presentation only, hot-reloaded).
    pub strategies: Vec<StrategyMeta>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (e.g., "127.0.0.1:8181").
    pub bind_address: String,

    /// Bearer key required on every admin request.
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8181".to_string(),
            api_key: "admin-secret-key".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON state file.
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: "failover-state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Program run to apply a strategy.
    pub program: String,

    /// Arguments; `{strategy}` is replaced by the strategy id.
    pub args: Vec<String>,

    /// Apply command timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            program: "apply-strategy".to_string(),
            args: vec!["{strategy}".to_string()],
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Strategy already live at startup, if any.
    pub initial_strategy: Option<String>,

    /// Upper bound on one activation, in seconds.
    pub activation_timeout_secs: u64,

    /// Share of reachable services below which a probe round is a failure.
    pub degraded_below: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_strategy: None,
            activation_timeout_secs: 30,
            degraded_below: DEFAULT_DEGRADED_BELOW,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Serve Prometheus metrics.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "strategy_failover=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9190".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: FailoverdConfig = toml::from_str("").unwrap();
        assert_eq!(config, FailoverdConfig::default());
        assert_eq!(config.gateway.timeout_secs, 15);
        assert_eq!(config.controller.degraded_below, 0.5);
    }

    #[test]
    fn test_full_toml() {
        let raw = r#"
            [admin]
            bind_address = "0.0.0.0:9000"
            api_key = "k"

            [gateway]
            program = "/usr/bin/winws-apply"
            args = ["--strategy", "{strategy}"]
            timeout_secs = 5

            [controller]
            initial_strategy = "general"

            [observability]
            log_format = "json"

            [[strategies]]
            id = "general"
            name = "General (fake TLS)"

            [[strategies]]
            id = "discord"
            name = "Discord"
            description = "UDP split"
        "#;
        let config: FailoverdConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.admin.bind_address, "0.0.0.0:9000");
        assert_eq!(config.gateway.args.len(), 2);
        assert_eq!(config.controller.initial_strategy.as_deref(), Some("general"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.strategies.len(), 2);
        assert_eq!(config.strategies[1].description.as_deref(), Some("UDP split"));
    }
}
