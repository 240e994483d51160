//! Tinkoff adapter configuration.

use std::time::Duration;

use crate::resilience::RetryPolicy;

/// Tinkoff Invest environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TinkoffEnvironment {
    /// Real brokerage accounts.
    Production,
    /// Sandbox accounts with virtual money.
    Sandbox,
}

impl TinkoffEnvironment {
    /// Base URL of the REST gateway.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://invest-public-api.tinkoff.ru",
            Self::Sandbox => "https://sandbox-invest-public-api.tinkoff.ru",
        }
    }

    /// Check if this is the sandbox.
    #[must_use]
    pub const fn is_sandbox(&self) -> bool {
        matches!(self, Self::Sandbox)
    }
}

impl std::fmt::Display for TinkoffEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "PRODUCTION"),
            Self::Sandbox => write!(f, "SANDBOX"),
        }
    }
}

/// Configuration for the Tinkoff gateway adapter.
#[derive(Debug, Clone)]
pub struct TinkoffConfig {
    /// API token (production or sandbox, matching `environment`).
    pub token: String,
    /// Target environment.
    pub environment: TinkoffEnvironment,
    /// Overrides the environment's base URL (mock servers, proxies).
    pub base_url: Option<String>,
    /// Value of the `x-app-name` header.
    pub app_name: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy for gateway calls.
    pub retry: RetryPolicy,
}

impl TinkoffConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(token: impl Into<String>, environment: TinkoffEnvironment) -> Self {
        Self {
            token: token.into(),
            environment,
            base_url: None,
            app_name: env!("CARGO_PKG_NAME").to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the adapter at a different gateway.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Effective base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }
}
