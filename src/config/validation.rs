//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and reports every
//! problem at once instead of stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.registry.path.trim().is_empty() {
        errors.push(ValidationError::new("registry.path", "must not be empty"));
    }

    if config.registry.health_interval_ms == 0 {
        errors.push(ValidationError::new(
            "registry.health_interval_ms",
            "must be greater than zero",
        ));
    }

    if config.registry.probe_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "registry.probe_timeout_ms",
            "must be greater than zero",
        ));
    } else if config.registry.probe_timeout_ms >= config.registry.health_interval_ms {
        errors.push(ValidationError::new(
            "registry.probe_timeout_ms",
            "must be shorter than the health interval",
        ));
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "breaker.failure_threshold",
            "must be at least 1",
        ));
    }

    if config.breaker.cooldown_ms == 0 {
        errors.push(ValidationError::new(
            "breaker.cooldown_ms",
            "must be greater than zero",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::new(
            "timeouts.upstream_ms",
            "must be greater than zero",
        ));
    } else if config.timeouts.upstream_ms >= config.timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::new(
            "timeouts.upstream_ms",
            "must be shorter than timeouts.request_secs",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
