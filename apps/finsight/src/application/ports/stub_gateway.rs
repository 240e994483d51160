//! Canned [`InvestGatewayPort`] for use case and controller tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{GatewayError, InvestGatewayPort};
use crate::domain::market_data::{Candle, CandleInterval};
use crate::domain::portfolio::{AccountSummary, Portfolio, PortfolioPosition};
use crate::domain::shared::{AccountId, Currency, InstrumentId, Isin, Timestamp};

/// Gateway returning preset results and counting calls.
pub struct StubGateway {
    pub summary: Result<AccountSummary, GatewayError>,
    pub candles: Result<Vec<Candle>, GatewayError>,
    pub portfolio: Result<Vec<PortfolioPosition>, GatewayError>,
    pub credential_valid: bool,
    pub candle_calls: AtomicUsize,
    pub last_candle_query: Mutex<Option<(String, NaiveDate, NaiveDate, CandleInterval)>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            summary: Ok(AccountSummary::from_ids(vec!["acc-1".to_string()])),
            candles: Ok(vec![]),
            portfolio: Ok(vec![]),
            credential_valid: true,
            candle_calls: AtomicUsize::new(0),
            last_candle_query: Mutex::new(None),
        }
    }
}

impl StubGateway {
    pub fn with_candles(count: usize) -> Self {
        let candles = (0..count)
            .map(|i| Candle {
                time: Timestamp::parse("2024-03-01T07:00:00Z").unwrap(),
                open: Decimal::from(i),
                close: Decimal::from(i),
                high: Decimal::from(i),
                low: Decimal::from(i),
                volume: i as u64,
                instrument_id: Some(InstrumentId::new("BBG004730N88")),
                interval: Some(CandleInterval::Day),
            })
            .collect();
        Self {
            candles: Ok(candles),
            ..Self::default()
        }
    }
}

#[async_trait]
impl InvestGatewayPort for StubGateway {
    async fn get_account_summary(&self) -> Result<AccountSummary, GatewayError> {
        self.summary.clone()
    }

    async fn get_candles(
        &self,
        isin: &Isin,
        from: NaiveDate,
        to: NaiveDate,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, GatewayError> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_candle_query.lock().unwrap() = Some((isin.to_string(), from, to, interval));
        self.candles.clone()
    }

    async fn get_portfolio(&self, account_id: &AccountId) -> Result<Portfolio, GatewayError> {
        self.portfolio
            .clone()
            .map(|positions| Portfolio::new(account_id.clone(), Currency::rub(), positions).unwrap())
    }

    async fn verify_credential(&self, _debug: bool) -> bool {
        self.credential_valid
    }
}
