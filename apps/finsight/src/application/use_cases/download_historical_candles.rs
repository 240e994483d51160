//! Download Historical Candles Use Case
//!
//! Fetches candle history for an ISIN through the gateway and stores it in
//! the candle repository.

use std::sync::Arc;

use crate::application::dto::HistoricalDataRequest;
use crate::application::ports::{
    CandleRepositoryPort, GatewayError, InvestGatewayPort, RepositoryError,
};

/// Errors from the download flow.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Fetching candles failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Storing candles failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Use case for downloading and storing candle history.
pub struct DownloadHistoricalCandlesUseCase<G, R>
where
    G: InvestGatewayPort,
    R: CandleRepositoryPort,
{
    gateway: Arc<G>,
    repository: Arc<R>,
}

impl<G, R> DownloadHistoricalCandlesUseCase<G, R>
where
    G: InvestGatewayPort,
    R: CandleRepositoryPort,
{
    /// Create a new `DownloadHistoricalCandlesUseCase`.
    pub const fn new(gateway: Arc<G>, repository: Arc<R>) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    /// Download the requested range and store it. Returns the stored count.
    pub async fn execute(&self, request: &HistoricalDataRequest) -> Result<usize, DownloadError> {
        tracing::info!(
            isin = %request.isin,
            from_date = %request.from_date,
            to_date = %request.to_date,
            interval = %request.interval,
            "Starting historical candle download"
        );

        let candles = self
            .gateway
            .get_candles(
                &request.isin,
                request.from_date,
                request.to_date,
                request.interval,
            )
            .await?;

        self.repository.save_all(&candles).await?;

        tracing::info!(isin = %request.isin, count = candles.len(), "Historical candle download finished");
        Ok(candles.len())
    }
}
