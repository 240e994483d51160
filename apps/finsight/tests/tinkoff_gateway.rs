//! Integration tests for the Tinkoff adapter against a mock REST gateway.
//!
//! Exercises the HTTP session, error mapping, retry and DTO translation
//! end to end through `InvestGatewayPort`.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::NaiveDate;
use finsight::application::ports::{FailureKind, GatewayError, InvestGatewayPort};
use finsight::domain::market_data::CandleInterval;
use finsight::domain::shared::{AccountId, Isin};
use finsight::infrastructure::tinkoff::{
    TinkoffConfig, TinkoffEnvironment, TinkoffError, TinkoffGatewayAdapter,
};
use finsight::resilience::RetryPolicy;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "t.integration";
const PREFIX: &str = "/rest/tinkoff.public.invest.api.contract.v1";

fn endpoint(service: &str, rpc: &str) -> String {
    format!("{PREFIX}.{service}/{rpc}")
}

fn adapter(server: &MockServer, max_attempts: u32) -> TinkoffGatewayAdapter {
    let config = TinkoffConfig::new(TOKEN, TinkoffEnvironment::Sandbox)
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(300))
        .with_retry(RetryPolicy::new(max_attempts, Duration::from_millis(5), 2.0));
    TinkoffGatewayAdapter::new(config).unwrap()
}

fn accounts_body() -> serde_json::Value {
    json!({
        "accounts": [
            {"id": "2001", "type": "ACCOUNT_TYPE_TINKOFF", "name": "Broker", "status": "ACCOUNT_STATUS_OPEN", "accessLevel": "ACCOUNT_ACCESS_LEVEL_READ_ONLY"},
            {"id": "2002", "type": "ACCOUNT_TYPE_TINKOFF_IIS", "name": "IIS", "status": "ACCOUNT_STATUS_OPEN", "accessLevel": "ACCOUNT_ACCESS_LEVEL_READ_ONLY"}
        ]
    })
}

fn sberbank() -> Isin {
    Isin::parse("RU0009029540").unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn account_summary_sends_bearer_token_and_app_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .and(bearer_token(TOKEN))
        .and(header("x-app-name", "finsight"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = adapter(&server, 3).get_account_summary().await.unwrap();

    assert_eq!(summary.accounts_count(), 2);
    assert_eq!(summary.account_ids(), ["2001", "2002"]);
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = adapter(&server, 3).get_account_summary().await.unwrap();

    assert_eq!(summary.accounts_count(), 2);
}

#[tokio::test]
async fn persistent_server_error_exhausts_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = adapter(&server, 3).get_account_summary().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 16,
            "message": "authentication token is missing or invalid",
            "description": "40003"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server, 5).get_account_summary().await.unwrap_err();

    assert!(matches!(err, GatewayError::Unauthorized { .. }), "{err:?}");
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(adapter(&server, 2).get_account_summary().await.is_ok());
}

#[tokio::test]
async fn slow_gateway_times_out_on_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(accounts_body())
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let err = adapter(&server, 2).get_account_summary().await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
}

#[tokio::test]
async fn candles_resolve_isin_then_fetch_and_translate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("InstrumentsService", "FindInstrument")))
        .and(body_partial_json(json!({"query": "RU0009029540"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "instruments": [
                {"isin": "RU000A0JX0J2", "figi": "BBG00OTHER00", "ticker": "OTHER"},
                {"isin": "RU0009029540", "figi": "BBG004730N88", "ticker": "SBER", "instrumentType": "share"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("MarketDataService", "GetCandles")))
        .and(body_partial_json(json!({
            "figi": "BBG004730N88",
            "from": "2024-03-01T00:00:00Z",
            "to": "2024-03-02T00:00:00Z",
            "interval": "CANDLE_INTERVAL_HOUR"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candles": [{
                "open": {"units": "284", "nano": 500000000},
                "high": {"units": "286", "nano": 0},
                "low": {"units": "283", "nano": 990000000},
                "close": {"units": "285", "nano": 100000000},
                "volume": "12345",
                "time": "2024-03-01T07:00:00Z",
                "isComplete": true
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candles = adapter(&server, 3)
        .get_candles(
            &sberbank(),
            date("2024-03-01"),
            date("2024-03-02"),
            CandleInterval::OneHour,
        )
        .await
        .unwrap();

    assert_eq!(candles.len(), 1);
    let candle = &candles[0];
    assert_eq!(candle.open, dec!(284.5));
    assert_eq!(candle.low, dec!(283.99));
    assert_eq!(candle.close, dec!(285.1));
    assert_eq!(candle.volume, 12_345);
    assert_eq!(candle.instrument_id.as_ref().unwrap().as_str(), "BBG004730N88");
    assert_eq!(candle.interval, Some(CandleInterval::OneHour));
}

#[tokio::test]
async fn unknown_isin_is_not_found_without_candle_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("InstrumentsService", "FindInstrument")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instruments": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("MarketDataService", "GetCandles")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candles": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter(&server, 3)
        .get_candles(
            &sberbank(),
            date("2024-03-01"),
            date("2024-03-02"),
            CandleInterval::Day,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::InstrumentNotFound { .. }), "{err:?}");
    assert_eq!(err.kind(), FailureKind::NotFound);
}

#[tokio::test]
async fn portfolio_totals_are_computed_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("OperationsService", "GetPortfolio")))
        .and(body_partial_json(json!({"accountId": "2001", "currency": "RUB"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalAmountPortfolio": {"currency": "rub", "units": "999999", "nano": 0},
            "accountId": "2001",
            "positions": [
                {
                    "figi": "BBG004730N88",
                    "instrumentType": "share",
                    "quantity": {"units": "10", "nano": 0},
                    "averagePositionPrice": {"currency": "rub", "units": "250", "nano": 0},
                    "expectedYield": {"units": "345", "nano": 0},
                    "currentPrice": {"currency": "rub", "units": "284", "nano": 500000000},
                    "instrumentUid": "e6123145-9665-43e0-8413-cd61b8aa9b13"
                },
                {
                    "figi": "BBG004731032",
                    "instrumentType": "share",
                    "quantity": {"units": "2", "nano": 0},
                    "currentPrice": {"currency": "rub", "units": "7000", "nano": 0}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let portfolio = adapter(&server, 3)
        .get_portfolio(&AccountId::new("2001"))
        .await
        .unwrap();

    assert_eq!(portfolio.positions().len(), 2);
    assert_eq!(portfolio.positions()[0].value, dec!(2845));
    assert_eq!(portfolio.total_value(), dec!(16845));
    assert_eq!(portfolio.currency().as_str(), "RUB");
}

#[tokio::test]
async fn verify_credential_reports_rejection_as_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!adapter(&server, 5).verify_credential(false).await);
}

#[tokio::test]
async fn verify_credential_with_debug_tolerates_diagnostic_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetAccounts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetUserTariff")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint("UsersService", "GetInfo")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "premStatus": false,
            "qualStatus": false,
            "tariff": "investor"
        })))
        .mount(&server)
        .await;

    assert!(adapter(&server, 2).verify_credential(true).await);
}

#[test]
fn empty_token_is_rejected_at_construction() {
    let config = TinkoffConfig::new("  ", TinkoffEnvironment::Production);
    let err = TinkoffGatewayAdapter::new(config).unwrap_err();
    assert_eq!(err, TinkoffError::MissingToken);
}
