//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(path) = lookup("GATEWAY_REGISTRY_FILE") {
        config.registry.path = path;
    }
    if let Some(threshold) = parse_var(&lookup, "GATEWAY_FAILURE_THRESHOLD")? {
        config.breaker.failure_threshold = threshold;
    }
    if let Some(cooldown) = parse_var(&lookup, "GATEWAY_COOLDOWN_MS")? {
        config.breaker.cooldown_ms = cooldown;
    }
    if let Some(interval) = parse_var(&lookup, "GATEWAY_HEALTH_INTERVAL_MS")? {
        config.registry.health_interval_ms = interval;
    }
    if let Some(timeout) = parse_var(&lookup, "GATEWAY_PROBE_TIMEOUT_MS")? {
        config.registry.probe_timeout_ms = timeout;
    }
    if let Some(timeout) = parse_var(&lookup, "GATEWAY_UPSTREAM_TIMEOUT_MS")? {
        config.timeouts.upstream_ms = timeout;
    }
    if let Some(key) = lookup("GATEWAY_ADMIN_KEY") {
        config.admin.api_key = Some(key).filter(|k| !k.is_empty());
    }
    if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        None => Ok(None),
    }
}
