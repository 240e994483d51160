//! HTTP response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{FailureKind, GatewayError};
use crate::domain::portfolio::{AccountSummary, Portfolio, PortfolioPosition};
use crate::domain::shared::DomainError;
use crate::infrastructure::worker::QueueError;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Startup, readiness and liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatusResponse {
    /// Always `ok` when the process answers.
    pub status: String,
}

/// Account summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummaryResponse {
    /// Number of accounts.
    pub accounts_count: usize,
    /// Account ids.
    pub account_ids: Vec<String>,
}

impl From<AccountSummary> for AccountSummaryResponse {
    fn from(summary: AccountSummary) -> Self {
        Self {
            accounts_count: summary.accounts_count(),
            account_ids: summary.account_ids().to_vec(),
        }
    }
}

/// A portfolio position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    /// Instrument FIGI.
    pub figi: String,
    /// Instrument type.
    pub instrument_type: String,
    /// Held quantity.
    pub quantity: Decimal,
    /// Average position price.
    pub average_price: Decimal,
    /// Current price.
    pub current_price: Decimal,
    /// Expected yield.
    pub expected_yield: Decimal,
    /// `current_price × quantity`.
    pub value: Decimal,
    /// Instrument uid.
    pub instrument_uid: String,
}

impl From<&PortfolioPosition> for PositionResponse {
    fn from(position: &PortfolioPosition) -> Self {
        Self {
            figi: position.instrument_id.as_str().to_string(),
            instrument_type: position.instrument_type.clone(),
            quantity: position.quantity,
            average_price: position.average_price,
            current_price: position.current_price,
            expected_yield: position.expected_yield,
            value: position.value,
            instrument_uid: position.instrument_uid.clone(),
        }
    }
}

/// Portfolio of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    /// Account id.
    pub account_id: String,
    /// Sum of position values.
    pub total_value: Decimal,
    /// Currency code.
    pub currency: String,
    /// Positions.
    pub positions: Vec<PositionResponse>,
}

impl From<&Portfolio> for PortfolioResponse {
    fn from(portfolio: &Portfolio) -> Self {
        Self {
            account_id: portfolio.account_id().as_str().to_string(),
            total_value: portfolio.total_value(),
            currency: portfolio.currency().as_str().to_string(),
            positions: portfolio.positions().iter().map(PositionResponse::from).collect(),
        }
    }
}

/// Accepted background download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadAcceptedResponse {
    /// Id of the queued task.
    pub task_id: String,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: String,
}

/// Handler failure rendered as [`ErrorResponse`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Request did not validate.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// Download could not be queued.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ApiError {
    /// HTTP status and error code.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Gateway(err) => match err.kind() {
                FailureKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                FailureKind::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
                FailureKind::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
                FailureKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                FailureKind::Transport => (StatusCode::BAD_GATEWAY, "transport"),
                FailureKind::InvalidResponse => (StatusCode::BAD_GATEWAY, "invalid_response"),
                FailureKind::Upstream => (StatusCode::BAD_GATEWAY, "upstream"),
                FailureKind::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            },
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Queue(QueueError::Full) => (StatusCode::SERVICE_UNAVAILABLE, "queue_full"),
            Self::Queue(QueueError::Closed) => (StatusCode::SERVICE_UNAVAILABLE, "queue_closed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::warn!(error = %self, code, "Request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{AccountId, Currency, InstrumentId};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(GatewayError::InstrumentNotFound { isin: "RU0009029540".into() }, StatusCode::NOT_FOUND ; "not found")]
    #[test_case(GatewayError::Unauthorized { message: "expired".into() }, StatusCode::UNAUTHORIZED ; "unauthorized")]
    #[test_case(GatewayError::RateLimited { message: "slow down".into() }, StatusCode::TOO_MANY_REQUESTS ; "rate limited")]
    #[test_case(GatewayError::Timeout { message: "deadline".into() }, StatusCode::GATEWAY_TIMEOUT ; "timeout")]
    #[test_case(GatewayError::transport("reset"), StatusCode::BAD_GATEWAY ; "transport")]
    #[test_case(GatewayError::Upstream { code: "30052".into(), message: "forbidden".into() }, StatusCode::BAD_GATEWAY ; "upstream")]
    #[test_case(GatewayError::Cancelled { attempts: 1 }, StatusCode::SERVICE_UNAVAILABLE ; "cancelled")]
    fn gateway_error_status(err: GatewayError, expected: StatusCode) {
        assert_eq!(ApiError::from(err).status_and_code().0, expected);
    }

    #[test]
    fn validation_is_bad_request() {
        let err = ApiError::from(DomainError::invalid("isin", "too short"));
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "validation_error"));
    }

    #[test]
    fn portfolio_response_uses_decimal_strings() {
        let portfolio = Portfolio::new(
            AccountId::new("2001"),
            Currency::rub(),
            vec![PortfolioPosition {
                instrument_id: InstrumentId::new("BBG004730N88"),
                instrument_type: "share".to_string(),
                quantity: dec!(10),
                expected_yield: dec!(0),
                average_price: dec!(250),
                current_price: dec!(284.5),
                value: dec!(2845),
                instrument_uid: "uid".to_string(),
            }],
        )
        .unwrap();

        let json = serde_json::to_value(PortfolioResponse::from(&portfolio)).unwrap();

        assert_eq!(json["account_id"], "2001");
        assert_eq!(json["total_value"], "2845");
        assert_eq!(json["currency"], "RUB");
        assert_eq!(json["positions"][0]["current_price"], "284.5");
        assert_eq!(json["positions"][0]["figi"], "BBG004730N88");
    }
}
