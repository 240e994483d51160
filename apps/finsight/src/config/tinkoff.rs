//! Tinkoff Invest credentials and transport settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::tinkoff::TinkoffEnvironment;

/// Tinkoff section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TinkoffSettings {
    /// Read-only production token.
    #[serde(default)]
    pub token: String,
    /// Sandbox token.
    #[serde(default)]
    pub sandbox_token: String,
    /// Talk to the sandbox instead of production.
    #[serde(default)]
    pub use_sandbox: bool,
    /// Overrides the environment's gateway URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TinkoffSettings {
    /// Selected environment.
    #[must_use]
    pub const fn environment(&self) -> TinkoffEnvironment {
        if self.use_sandbox {
            TinkoffEnvironment::Sandbox
        } else {
            TinkoffEnvironment::Production
        }
    }

    /// Token matching the selected environment.
    #[must_use]
    pub fn active_token(&self) -> &str {
        if self.use_sandbox {
            &self.sandbox_token
        } else {
            &self.token
        }
    }

    /// Name of the setting holding the active token, for error messages.
    #[must_use]
    pub const fn active_token_field(&self) -> &'static str {
        if self.use_sandbox {
            "tinkoff.sandbox_token"
        } else {
            "tinkoff.token"
        }
    }

    /// HTTP timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const fn default_timeout_secs() -> u64 {
    30
}
