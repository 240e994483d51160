//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Accepted values of `logging.level`.
pub const LOG_LEVELS: [&str; 3] = ["info", "warning", "error"];

/// Accepted values of `logging.format`.
pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: info, warning or error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: pretty or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Default `EnvFilter` directive for this crate, used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        let level = match self.level.as_str() {
            "warning" => "warn",
            other => other,
        };
        format!("finsight={level}")
    }

    /// Whether logs are emitted as JSON lines.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
