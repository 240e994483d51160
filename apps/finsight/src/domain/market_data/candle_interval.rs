//! Candle aggregation interval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Time span covered by a single candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CandleInterval {
    /// 1 minute.
    OneMinute,
    /// 2 minutes.
    TwoMinutes,
    /// 3 minutes.
    ThreeMinutes,
    /// 5 minutes.
    FiveMinutes,
    /// 10 minutes.
    TenMinutes,
    /// 15 minutes.
    FifteenMinutes,
    /// 30 minutes.
    ThirtyMinutes,
    /// 1 hour.
    OneHour,
    /// 2 hours.
    TwoHours,
    /// 4 hours.
    FourHours,
    /// 1 trading day.
    #[default]
    Day,
    /// 1 week.
    Week,
    /// 1 month.
    Month,
}

impl CandleInterval {
    /// All intervals, shortest first.
    pub const ALL: [Self; 13] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::ThreeMinutes,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::FourHours,
        Self::Day,
        Self::Week,
        Self::Month,
    ];

    /// Short code (`1m`, `4h`, `1mo`, ...).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::FourHours => "4h",
            Self::Day => "1d",
            Self::Week => "1w",
            Self::Month => "1mo",
        }
    }

    /// Long name accepted by the command line (`5min`, `hour`, `day`, ...).
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::TwoMinutes => "2min",
            Self::ThreeMinutes => "3min",
            Self::FiveMinutes => "5min",
            Self::TenMinutes => "10min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::OneHour => "hour",
            Self::TwoHours => "2hour",
            Self::FourHours => "4hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl FromStr for CandleInterval {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|i| i.code() == needle || i.long_name() == needle)
            .ok_or_else(|| DomainError::invalid("interval", format!("unknown interval '{s}'")))
    }
}

impl TryFrom<String> for CandleInterval {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CandleInterval> for String {
    fn from(interval: CandleInterval) -> Self {
        interval.code().to_string()
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
