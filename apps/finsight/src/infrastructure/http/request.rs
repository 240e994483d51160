//! HTTP request DTOs.

use serde::{Deserialize, Serialize};

use crate::application::dto::HistoricalDataRequest;
use crate::domain::shared::DomainError;

/// Request to download candle history in the background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadCandlesRequest {
    /// Instrument ISIN.
    pub isin: String,
    /// First day, `YYYY-MM-DD`.
    pub from_date: String,
    /// Last day, `YYYY-MM-DD`.
    pub to_date: String,
    /// Candle interval (`1d`, `hour`, `5m`, ...). Defaults to daily.
    #[serde(default)]
    pub interval: Option<String>,
}

impl DownloadCandlesRequest {
    /// Validate into an application request.
    pub fn into_domain(self) -> Result<HistoricalDataRequest, DomainError> {
        HistoricalDataRequest::parse(
            &self.isin,
            &self.from_date,
            &self.to_date,
            self.interval.as_deref(),
        )
    }
}
