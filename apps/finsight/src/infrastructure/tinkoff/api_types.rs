//! Tinkoff Invest API request and response types.
//!
//! These types map directly to the REST gateway's JSON format (camelCase,
//! 64-bit integers encoded as strings) and translate into domain records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::GatewayError;
use crate::domain::market_data::{Candle, CandleInterval};
use crate::domain::portfolio::{AccountSummary, PortfolioPosition};
use crate::domain::shared::{Currency, InstrumentId, Timestamp};

/// Serde helpers for `int64` fields, which the gateway sends as strings.
mod int64 {
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

// ============================================================================
// Price Types
// ============================================================================

/// Fixed-point number as `units` plus `nano` billionths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quotation {
    /// Integer part.
    #[serde(with = "int64")]
    pub units: i64,
    /// Fractional part in 1e-9 units, same sign as `units`.
    pub nano: i32,
}

impl Quotation {
    /// Create a quotation.
    #[must_use]
    pub const fn new(units: i64, nano: i32) -> Self {
        Self { units, nano }
    }

    /// Exact value `units + nano / 1e9`.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        units_nano_to_decimal(self.units, self.nano)
    }
}

/// Amount of money in a given currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyValue {
    /// Currency code as sent upstream (`rub`, `usd`).
    pub currency: String,
    /// Integer part.
    #[serde(with = "int64")]
    pub units: i64,
    /// Fractional part in 1e-9 units.
    pub nano: i32,
}

impl MoneyValue {
    /// Exact amount `units + nano / 1e9`.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        units_nano_to_decimal(self.units, self.nano)
    }

    /// Currency of the amount, if it is a valid code.
    #[must_use]
    pub fn currency(&self) -> Option<Currency> {
        Currency::parse(&self.currency).ok()
    }
}

fn units_nano_to_decimal(units: i64, nano: i32) -> Decimal {
    (Decimal::from(units) + Decimal::new(i64::from(nano), 9)).normalize()
}

// ============================================================================
// Users Service
// ============================================================================

/// Empty request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyRequest {}

/// Brokerage account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountDto {
    /// Account id.
    pub id: String,
    /// Account type (`ACCOUNT_TYPE_TINKOFF`, ...).
    #[serde(rename = "type")]
    pub account_type: String,
    /// Display name.
    pub name: String,
    /// Account status.
    pub status: String,
    /// Access level of the token for this account.
    pub access_level: String,
}

/// Response of `UsersService/GetAccounts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetAccountsResponse {
    /// Accounts visible to the token.
    pub accounts: Vec<AccountDto>,
}

/// Translate an account list into a summary, preserving order.
#[must_use]
pub fn accounts_to_summary(accounts: &[AccountDto]) -> AccountSummary {
    AccountSummary::from_ids(accounts.iter().map(|a| a.id.clone()).collect())
}

/// Unary request limit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnaryLimit {
    /// Requests allowed per minute.
    pub limit_per_minute: i32,
    /// Methods sharing the limit.
    pub methods: Vec<String>,
}

/// Stream connection limit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamLimit {
    /// Concurrent connections allowed.
    pub limit: i32,
    /// Streams sharing the limit.
    pub streams: Vec<String>,
    /// Currently open connections.
    pub open: i32,
}

/// Response of `UsersService/GetUserTariff`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetUserTariffResponse {
    /// Unary limits.
    pub unary_limits: Vec<UnaryLimit>,
    /// Stream limits.
    pub stream_limits: Vec<StreamLimit>,
}

/// Response of `UsersService/GetInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetInfoResponse {
    /// Premium status.
    pub prem_status: bool,
    /// Qualified investor status.
    pub qual_status: bool,
    /// Instrument groups available to a qualified investor.
    pub qualified_for_work_with: Vec<String>,
    /// Tariff name.
    pub tariff: String,
    /// User id.
    pub user_id: String,
}

// ============================================================================
// Instruments Service
// ============================================================================

/// Request of `InstrumentsService/FindInstrument`.
#[derive(Debug, Clone, Serialize)]
pub struct FindInstrumentRequest {
    /// Search string (ISIN, ticker, FIGI or name).
    pub query: String,
}

/// Short instrument description from a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentShort {
    /// ISIN.
    pub isin: String,
    /// FIGI.
    pub figi: String,
    /// Ticker.
    pub ticker: String,
    /// Instrument uid.
    pub uid: String,
    /// Instrument type.
    pub instrument_type: String,
    /// Display name.
    pub name: String,
}

/// Response of `InstrumentsService/FindInstrument`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FindInstrumentResponse {
    /// Matching instruments.
    pub instruments: Vec<InstrumentShort>,
}

impl FindInstrumentResponse {
    /// Instrument whose ISIN equals `isin`, else the first result.
    #[must_use]
    pub fn best_match(&self, isin: &str) -> Option<&InstrumentShort> {
        self.instruments
            .iter()
            .find(|i| i.isin.eq_ignore_ascii_case(isin))
            .or_else(|| self.instruments.first())
    }
}

// ============================================================================
// Market Data Service
// ============================================================================

/// Wire name of a candle interval.
#[must_use]
pub const fn interval_to_wire(interval: CandleInterval) -> &'static str {
    match interval {
        CandleInterval::OneMinute => "CANDLE_INTERVAL_1_MIN",
        CandleInterval::TwoMinutes => "CANDLE_INTERVAL_2_MIN",
        CandleInterval::ThreeMinutes => "CANDLE_INTERVAL_3_MIN",
        CandleInterval::FiveMinutes => "CANDLE_INTERVAL_5_MIN",
        CandleInterval::TenMinutes => "CANDLE_INTERVAL_10_MIN",
        CandleInterval::FifteenMinutes => "CANDLE_INTERVAL_15_MIN",
        CandleInterval::ThirtyMinutes => "CANDLE_INTERVAL_30_MIN",
        CandleInterval::OneHour => "CANDLE_INTERVAL_HOUR",
        CandleInterval::TwoHours => "CANDLE_INTERVAL_2_HOUR",
        CandleInterval::FourHours => "CANDLE_INTERVAL_4_HOUR",
        CandleInterval::Day => "CANDLE_INTERVAL_DAY",
        CandleInterval::Week => "CANDLE_INTERVAL_WEEK",
        CandleInterval::Month => "CANDLE_INTERVAL_MONTH",
    }
}

/// Request of `MarketDataService/GetCandles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetCandlesRequest {
    /// Instrument FIGI.
    pub figi: String,
    /// Period start.
    pub from: DateTime<Utc>,
    /// Period end.
    pub to: DateTime<Utc>,
    /// Wire interval name.
    pub interval: String,
}

impl GetCandlesRequest {
    /// Request for `[from, to]`, both dates taken at 00:00 UTC.
    #[must_use]
    pub fn new(figi: &str, from: NaiveDate, to: NaiveDate, interval: CandleInterval) -> Self {
        Self {
            figi: figi.to_string(),
            from: Timestamp::start_of_day(from).as_datetime(),
            to: Timestamp::start_of_day(to).as_datetime(),
            interval: interval_to_wire(interval).to_string(),
        }
    }
}

/// Historical candle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricCandleDto {
    /// Opening price.
    #[serde(default)]
    pub open: Quotation,
    /// Highest price.
    #[serde(default)]
    pub high: Quotation,
    /// Lowest price.
    #[serde(default)]
    pub low: Quotation,
    /// Closing price.
    #[serde(default)]
    pub close: Quotation,
    /// Volume in lots.
    #[serde(default, with = "int64")]
    pub volume: i64,
    /// Interval start.
    pub time: DateTime<Utc>,
    /// Whether the interval is closed.
    #[serde(default)]
    pub is_complete: bool,
}

impl HistoricCandleDto {
    /// Convert to a domain `Candle` tagged with the instrument and interval.
    ///
    /// A negative volume is a malformed response.
    pub fn to_candle(&self, figi: &str, interval: CandleInterval) -> Result<Candle, GatewayError> {
        let volume = u64::try_from(self.volume).map_err(|_| GatewayError::InvalidResponse {
            message: format!("negative candle volume {} for {figi} at {}", self.volume, self.time),
        })?;
        Ok(Candle {
            time: Timestamp::new(self.time),
            open: self.open.to_decimal(),
            close: self.close.to_decimal(),
            high: self.high.to_decimal(),
            low: self.low.to_decimal(),
            volume,
            instrument_id: Some(InstrumentId::new(figi)),
            interval: Some(interval),
        })
    }
}

/// Response of `MarketDataService/GetCandles`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetCandlesResponse {
    /// Candles in chronological order.
    pub candles: Vec<HistoricCandleDto>,
}

// ============================================================================
// Operations Service
// ============================================================================

/// Request of `OperationsService/GetPortfolio`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRequest {
    /// Account id.
    pub account_id: String,
    /// Currency for totals.
    pub currency: String,
}

impl PortfolioRequest {
    /// Portfolio request with totals in roubles.
    #[must_use]
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            currency: "RUB".to_string(),
        }
    }
}

/// Position inside a portfolio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioPositionDto {
    /// Instrument FIGI.
    pub figi: String,
    /// Instrument type.
    pub instrument_type: String,
    /// Held quantity.
    pub quantity: Quotation,
    /// Average position price.
    pub average_position_price: MoneyValue,
    /// Expected yield.
    pub expected_yield: Quotation,
    /// Current price.
    pub current_price: MoneyValue,
    /// Instrument uid.
    pub instrument_uid: String,
}

impl PortfolioPositionDto {
    /// Convert to a domain position; `value` is `current_price × quantity`.
    ///
    /// A value outside the `Decimal` range is a malformed response.
    pub fn to_position(&self) -> Result<PortfolioPosition, GatewayError> {
        let quantity = self.quantity.to_decimal();
        let current_price = self.current_price.to_decimal();
        let value = current_price
            .checked_mul(quantity)
            .ok_or_else(|| GatewayError::InvalidResponse {
                message: format!("position value of {} overflows", self.figi),
            })?;
        Ok(PortfolioPosition {
            instrument_id: InstrumentId::new(&self.figi),
            instrument_type: self.instrument_type.clone(),
            quantity,
            expected_yield: self.expected_yield.to_decimal(),
            average_price: self.average_position_price.to_decimal(),
            current_price,
            value: value.normalize(),
            instrument_uid: self.instrument_uid.clone(),
        })
    }
}

/// Response of `OperationsService/GetPortfolio`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioResponse {
    /// Upstream portfolio total (not used for totals).
    pub total_amount_portfolio: Option<MoneyValue>,
    /// Positions.
    pub positions: Vec<PortfolioPositionDto>,
    /// Account id.
    pub account_id: String,
}

impl PortfolioResponse {
    /// Currency of the portfolio; roubles when upstream omits it.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.total_amount_portfolio
            .as_ref()
            .and_then(MoneyValue::currency)
            .unwrap_or_else(Currency::rub)
    }
}
