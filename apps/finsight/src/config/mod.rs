//! Configuration module.
//!
//! Loads `config.yaml`, interpolates environment variables and validates
//! the result before anything touches the network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use finsight::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("deploy/config.yaml"))?;
//!
//! println!("HTTP port: {}", config.server.port);
//! ```

mod environment;
mod observability;
mod retry;
mod server;
mod tinkoff;
mod worker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use environment::{ENVIRONMENT_MODES, EnvironmentConfig};
pub use observability::{LOG_FORMATS, LOG_LEVELS, LoggingConfig};
pub use retry::RetrySettings;
pub use server::ServerConfig;
pub use tinkoff::TinkoffSettings;
pub use worker::WorkerConfig;

use crate::infrastructure::tinkoff::TinkoffConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Deployment environment.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tinkoff Invest credentials and transport.
    #[serde(default)]
    pub tinkoff: TinkoffSettings,
    /// Retry policy for gateway calls.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Background download worker.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl Config {
    /// Adapter configuration for the selected Tinkoff environment.
    pub fn tinkoff_config(&self) -> Result<TinkoffConfig, ConfigError> {
        let settings = &self.tinkoff;
        let token = settings.active_token();
        if token.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} must be set",
                settings.active_token_field()
            )));
        }

        let mut config = TinkoffConfig::new(token, settings.environment())
            .with_timeout(settings.timeout())
            .with_retry(self.retry.to_policy());
        if let Some(base_url) = settings.base_url.as_deref().filter(|url| !url.is_empty()) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port <= 1024 {
        return Err(ConfigError::ValidationError(format!(
            "server.port must be between 1025 and 65535, got {}",
            config.server.port
        )));
    }

    if !ENVIRONMENT_MODES.contains(&config.environment.mode.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "environment.mode must be one of: {ENVIRONMENT_MODES:?}"
        )));
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.level must be one of: {LOG_LEVELS:?}"
        )));
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.format must be one of: {LOG_FORMATS:?}"
        )));
    }

    if config.tinkoff.active_token().trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} must be set for the {} environment",
            config.tinkoff.active_token_field(),
            config.tinkoff.environment()
        )));
    }

    if config.tinkoff.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tinkoff.timeout_secs must be positive".to_string(),
        ));
    }

    config
        .retry
        .to_policy()
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("retry: {e}")))?;

    if config.worker.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "worker.queue_capacity must be positive".to_string(),
        ));
    }

    Ok(())
}
