//! Candle Repository Port (Driven Port)
//!
//! Sink for downloaded candles. Append semantics, no deduplication contract.

use async_trait::async_trait;

use crate::domain::market_data::Candle;

/// Candle repository error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// Storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Error details.
        message: String,
    },
}

/// Port for persisting candles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleRepositoryPort: Send + Sync {
    /// Store a batch of candles.
    async fn save_all(&self, candles: &[Candle]) -> Result<(), RepositoryError>;
}
