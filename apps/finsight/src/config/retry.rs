//! Retry settings for gateway calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::RetryPolicy;

/// Retry section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after each retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// Policy retrying the default transient failure kinds.
    #[must_use]
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_multiplier,
        )
        .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_initial_delay_ms() -> u64 {
    500
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_max_delay_ms() -> u64 {
    30_000
}
