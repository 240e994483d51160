//! OHLCV candle record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CandleInterval;
use crate::domain::shared::{InstrumentId, Timestamp};

/// One open/high/low/close/volume summary for a single interval.
///
/// Produced per historical-data request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Interval start.
    pub time: Timestamp,
    /// Opening price.
    pub open: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Highest price in the interval.
    pub high: Decimal,
    /// Lowest price in the interval.
    pub low: Decimal,
    /// Traded volume in lots.
    pub volume: u64,
    /// Instrument the candle belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_id: Option<InstrumentId>,
    /// Aggregation interval, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<CandleInterval>,
}
