//! Invest Gateway Port (Driven Port)
//!
//! Capability set the application needs from the brokerage, independent of
//! the transport used to reach it.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::market_data::{Candle, CandleInterval};
use crate::domain::portfolio::{AccountSummary, Portfolio};
use crate::domain::shared::{AccountId, Isin};

/// Category of a gateway failure, used to decide whether a call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, reset, DNS failure or a 5xx answer.
    Transport,
    /// The request did not complete in time.
    Timeout,
    /// Upstream throttled the request.
    RateLimited,
    /// An identifier could not be resolved.
    NotFound,
    /// The credential was rejected.
    Unauthorized,
    /// Upstream answered with something we cannot decode.
    InvalidResponse,
    /// Any other upstream rejection.
    Upstream,
    /// The call was abandoned on shutdown.
    Cancelled,
}

impl FailureKind {
    /// Every failure kind.
    pub const ALL: [Self; 8] = [
        Self::Transport,
        Self::Timeout,
        Self::RateLimited,
        Self::NotFound,
        Self::Unauthorized,
        Self::InvalidResponse,
        Self::Upstream,
        Self::Cancelled,
    ];

    /// Kinds for which [`FailureKind::is_transient`] holds.
    pub fn transient() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|kind| kind.is_transient())
    }

    /// Whether the failure is transient at the transport level.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transport | Self::Timeout | Self::RateLimited)
    }
}

/// Errors surfaced by [`InvestGatewayPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network-level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out: {message}")]
    Timeout {
        /// Error details.
        message: String,
    },

    /// Request was throttled.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Error details.
        message: String,
    },

    /// The ISIN did not resolve to any instrument.
    #[error("Instrument not found for ISIN {isin}")]
    InstrumentNotFound {
        /// The ISIN that was looked up.
        isin: String,
    },

    /// The credential is invalid or expired.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error details.
        message: String,
    },

    /// The response could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error details.
        message: String,
    },

    /// Upstream rejected the request.
    #[error("Upstream error {code}: {message}")]
    Upstream {
        /// Upstream error code.
        code: String,
        /// Upstream error message.
        message: String,
    },

    /// Shutdown interrupted the call or its retries.
    #[error("Cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts started before cancellation.
        attempts: u32,
    },
}

impl GatewayError {
    /// Failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::InstrumentNotFound { .. } => FailureKind::NotFound,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::InvalidResponse { .. } => FailureKind::InvalidResponse,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Port for the brokerage gateway.
///
/// Operations may fail with transport-level kinds (`Transport`, `Timeout`,
/// `RateLimited`), with `NotFound` when an ISIN cannot be resolved, with
/// `Unauthorized` when the credential is rejected, or with `Cancelled` on
/// shutdown.
#[async_trait]
pub trait InvestGatewayPort: Send + Sync {
    /// Summary of the accounts visible to the credential.
    async fn get_account_summary(&self) -> Result<AccountSummary, GatewayError>;

    /// Historical candles for an ISIN between two dates (both at 00:00 UTC).
    async fn get_candles(
        &self,
        isin: &Isin,
        from: NaiveDate,
        to: NaiveDate,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, GatewayError>;

    /// Current portfolio of an account.
    async fn get_portfolio(&self, account_id: &AccountId) -> Result<Portfolio, GatewayError>;

    /// Check that the credential works.
    ///
    /// Never fails: any error is reported as `false`. With `debug` set,
    /// auxiliary diagnostics are logged; their failures do not affect the result.
    async fn verify_credential(&self, debug: bool) -> bool;
}
