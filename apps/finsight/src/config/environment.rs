//! Deployment environment.

use serde::{Deserialize, Serialize};

/// Accepted values of `environment.mode`.
pub const ENVIRONMENT_MODES: [&str; 3] = ["local", "dev", "production"];

/// Environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Deployment mode: local, dev or production.
    #[serde(default = "default_environment_mode")]
    pub mode: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            mode: default_environment_mode(),
        }
    }
}

impl EnvironmentConfig {
    /// Whether the process runs on a developer machine.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.mode == "local"
    }
}

fn default_environment_mode() -> String {
    "local".to_string()
}
