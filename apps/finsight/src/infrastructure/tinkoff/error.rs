//! Tinkoff-specific error types.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::application::ports::GatewayError;
use crate::resilience::RetryConfigError;

/// Errors from the Tinkoff adapter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TinkoffError {
    /// Request could not be sent or the connection broke.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Gateway answered with a 5xx status.
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// Token rejected (401/403).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limited (429).
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Gateway rejected the request with a structured error.
    #[error("API error: {code} - {message}")]
    Api {
        /// Tinkoff error code.
        code: String,
        /// Error message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// No token configured.
    #[error("Tinkoff API token is not configured")]
    MissingToken,

    /// Retry policy rejected at construction.
    #[error(transparent)]
    InvalidRetry(#[from] RetryConfigError),
}

/// Error body returned by the REST gateway.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: String,
    description: Option<String>,
}

impl TinkoffError {
    /// Classify a transport failure reported by `reqwest`.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::JsonParse(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }

    /// Build an error from a non-success status and its body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            body.to_string()
        } else {
            parsed.message
        };

        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed(message),
            429 => Self::RateLimited(message),
            500..=599 => Self::Server {
                status: status.as_u16(),
                message,
            },
            _ => {
                // Tinkoff puts its numeric error code into `description`.
                let code = parsed
                    .description
                    .filter(|d| !d.is_empty())
                    .or_else(|| parsed.code.map(|c| c.to_string().trim_matches('"').to_string()))
                    .unwrap_or_else(|| status.as_u16().to_string());
                Self::Api { code, message }
            }
        }
    }
}

impl From<TinkoffError> for GatewayError {
    fn from(err: TinkoffError) -> Self {
        match err {
            TinkoffError::Http(message) => Self::Transport { message },
            TinkoffError::Server { status, message } => Self::Transport {
                message: format!("{status}: {message}"),
            },
            TinkoffError::Timeout(message) => Self::Timeout { message },
            TinkoffError::RateLimited(message) => Self::RateLimited { message },
            TinkoffError::AuthenticationFailed(message) => Self::Unauthorized { message },
            TinkoffError::MissingToken => Self::Unauthorized {
                message: "token is not configured".to_string(),
            },
            TinkoffError::JsonParse(message) => Self::InvalidResponse { message },
            TinkoffError::Api { code, message } => Self::Upstream { code, message },
            TinkoffError::InvalidRetry(err) => Self::Upstream {
                code: "config".to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::FailureKind;
    use test_case::test_case;

    #[test_case(401, FailureKind::Unauthorized ; "unauthorized")]
    #[test_case(403, FailureKind::Unauthorized ; "forbidden")]
    #[test_case(429, FailureKind::RateLimited ; "too many requests")]
    #[test_case(500, FailureKind::Transport ; "internal server error")]
    #[test_case(503, FailureKind::Transport ; "service unavailable")]
    #[test_case(400, FailureKind::Upstream ; "bad request")]
    #[test_case(404, FailureKind::Upstream ; "not found")]
    fn status_maps_to_failure_kind(status: u16, expected: FailureKind) {
        let status = StatusCode::from_u16(status).unwrap();
        let err: GatewayError = TinkoffError::from_status(status, "").into();
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn api_error_uses_tinkoff_description_code() {
        let body = r#"{"code":3,"message":"instrument not found","description":"50002"}"#;
        let err = TinkoffError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err,
            TinkoffError::Api {
                code: "50002".to_string(),
                message: "instrument not found".to_string(),
            }
        );
    }

    #[test]
    fn api_error_falls_back_to_grpc_code() {
        let body = r#"{"code":5,"message":"not found"}"#;
        let TinkoffError::Api { code, .. } = TinkoffError::from_status(StatusCode::NOT_FOUND, body)
        else {
            panic!("expected API error");
        };
        assert_eq!(code, "5");
    }

    #[test]
    fn unparsable_body_kept_as_message() {
        let err = TinkoffError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(err.to_string().contains("<html>bad gateway</html>"));
    }

    #[test]
    fn json_parse_maps_to_invalid_response() {
        let err: GatewayError = TinkoffError::JsonParse("eof".to_string()).into();
        assert_eq!(err.kind(), FailureKind::InvalidResponse);
    }

    #[test]
    fn missing_token_maps_to_unauthorized() {
        let err: GatewayError = TinkoffError::MissingToken.into();
        assert_eq!(err.kind(), FailureKind::Unauthorized);
    }
}
