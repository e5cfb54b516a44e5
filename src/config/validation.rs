//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and ratios
//! - Detect duplicate strategy ids in the catalog
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: FailoverdConfig → Result<(), Vec<InvalidSetting>>

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::FailoverdConfig;

/// One rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSetting {
    pub field: String,
    pub message: String,
}

impl InvalidSetting {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &FailoverdConfig) -> Result<(), Vec<InvalidSetting>> {
    let mut errors = Vec::new();

    if config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(InvalidSetting::new(
            "admin.bind_address",
            format!("invalid socket address '{}'", config.admin.bind_address),
        ));
    }
    if config.admin.api_key.trim().is_empty() {
        errors.push(InvalidSetting::new("admin.api_key", "must not be empty"));
    }

    if config.storage.state_path.trim().is_empty() {
        errors.push(InvalidSetting::new("storage.state_path", "must not be empty"));
    }

    if config.gateway.program.trim().is_empty() {
        errors.push(InvalidSetting::new("gateway.program", "must not be empty"));
    }
    if config.gateway.timeout_secs == 0 {
        errors.push(InvalidSetting::new("gateway.timeout_secs", "must be > 0"));
    }

    if config.controller.activation_timeout_secs == 0 {
        errors.push(InvalidSetting::new(
            "controller.activation_timeout_secs",
            "must be > 0",
        ));
    }
    let ratio = config.controller.degraded_below;
    if !(ratio > 0.0 && ratio <= 1.0) {
        errors.push(InvalidSetting::new(
            "controller.degraded_below",
            format!("{ratio} not in (0, 1]"),
        ));
    }
    if let Some(initial) = &config.controller.initial_strategy {
        if initial.trim().is_empty() {
            errors.push(InvalidSetting::new(
                "controller.initial_strategy",
                "must not be empty when set",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(InvalidSetting::new(
            "observability.metrics_address",
            format!(
                "invalid socket address '{}'",
                config.observability.metrics_address
            ),
        ));
    }

    let mut seen = HashSet::new();
    for (i, strategy) in config.strategies.iter().enumerate() {
        if strategy.id.as_str().trim().is_empty() {
            errors.push(InvalidSetting::new(
                format!("strategies[{i}].id"),
                "must not be empty",
            ));
        } else if !seen.insert(strategy.id.clone()) {
            errors.push(InvalidSetting::new(
                format!("strategies[{i}].id"),
                format!("duplicate id '{}'", strategy.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
