//! In-memory candle repository.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::application::ports::{CandleRepositoryPort, RepositoryError};
use crate::domain::market_data::Candle;
use crate::domain::shared::InstrumentId;

/// In-memory implementation of `CandleRepositoryPort`.
///
/// Appends every saved batch; duplicates are kept. Suitable for tests and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryCandleRepository {
    candles: RwLock<Vec<Candle>>,
}

impl InMemoryCandleRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored candles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all candles.
    pub fn clear(&self) {
        self.candles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Stored candles of one instrument, in insertion order.
    #[must_use]
    pub fn candles_for(&self, instrument_id: &InstrumentId) -> Vec<Candle> {
        self.candles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.instrument_id.as_ref() == Some(instrument_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CandleRepositoryPort for InMemoryCandleRepository {
    async fn save_all(&self, candles: &[Candle]) -> Result<(), RepositoryError> {
        let mut stored = self.candles.write().map_err(|e| RepositoryError::Storage {
            message: e.to_string(),
        })?;
        stored.extend_from_slice(candles);
        tracing::debug!(saved = candles.len(), total = stored.len(), "Candles stored");
        Ok(())
    }
}
