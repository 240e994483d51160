//! Historical candle download request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::market_data::CandleInterval;
use crate::domain::shared::{DomainError, Isin};

/// Input of the historical candle download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HistoricalDataRecord")]
pub struct HistoricalDataRequest {
    /// Instrument ISIN.
    pub isin: Isin,
    /// First day (inclusive, 00:00 UTC).
    pub from_date: NaiveDate,
    /// Last day (00:00 UTC).
    pub to_date: NaiveDate,
    /// Candle interval.
    #[serde(default)]
    pub interval: CandleInterval,
}

impl HistoricalDataRequest {
    /// Build a request, rejecting ranges that end before they start.
    pub fn new(
        isin: Isin,
        from_date: NaiveDate,
        to_date: NaiveDate,
        interval: CandleInterval,
    ) -> Result<Self, DomainError> {
        if from_date > to_date {
            return Err(DomainError::InvalidRange {
                from: from_date.to_string(),
                to: to_date.to_string(),
            });
        }
        Ok(Self {
            isin,
            from_date,
            to_date,
            interval,
        })
    }

    /// Parse the textual form used by the command line and the REST API.
    pub fn parse(
        isin: &str,
        from_date: &str,
        to_date: &str,
        interval: Option<&str>,
    ) -> Result<Self, DomainError> {
        let isin = Isin::parse(isin)?;
        let from_date = parse_date("from_date", from_date)?;
        let to_date = parse_date("to_date", to_date)?;
        let interval = interval.map_or(Ok(CandleInterval::Day), |s| s.parse())?;
        Self::new(isin, from_date, to_date, interval)
    }
}

#[derive(Deserialize)]
struct HistoricalDataRecord {
    isin: Isin,
    from_date: NaiveDate,
    to_date: NaiveDate,
    #[serde(default)]
    interval: CandleInterval,
}

impl TryFrom<HistoricalDataRecord> for HistoricalDataRequest {
    type Error = DomainError;

    fn try_from(record: HistoricalDataRecord) -> Result<Self, Self::Error> {
        Self::new(record.isin, record.from_date, record.to_date, record.interval)
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::invalid(field, format!("expected YYYY-MM-DD, got '{value}'")))
}
