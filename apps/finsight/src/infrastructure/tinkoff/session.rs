//! Scoped gateway sessions.
//!
//! A [`SessionFactory`] opens one [`InvestSession`] per call attempt. The
//! session is owned by that attempt and released when it is dropped, on
//! success and failure alike.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::application::ports::GatewayError;

use super::api_types::{
    EmptyRequest, FindInstrumentRequest, FindInstrumentResponse, GetAccountsResponse,
    GetCandlesRequest, GetCandlesResponse, GetInfoResponse, GetUserTariffResponse,
    PortfolioRequest, PortfolioResponse,
};
use super::config::TinkoffConfig;
use super::error::TinkoffError;

const CONTRACT_PREFIX: &str = "tinkoff.public.invest.api.contract.v1";

/// One authenticated conversation with the gateway.
#[async_trait]
pub trait InvestSession: Send + Sync {
    /// `UsersService/GetAccounts`.
    async fn get_accounts(&self) -> Result<GetAccountsResponse, GatewayError>;

    /// `UsersService/GetUserTariff`.
    async fn get_user_tariff(&self) -> Result<GetUserTariffResponse, GatewayError>;

    /// `UsersService/GetInfo`.
    async fn get_info(&self) -> Result<GetInfoResponse, GatewayError>;

    /// `InstrumentsService/FindInstrument`.
    async fn find_instrument(&self, query: &str) -> Result<FindInstrumentResponse, GatewayError>;

    /// `MarketDataService/GetCandles`.
    async fn get_candles(
        &self,
        request: &GetCandlesRequest,
    ) -> Result<GetCandlesResponse, GatewayError>;

    /// `OperationsService/GetPortfolio`.
    async fn get_portfolio(&self, account_id: &str) -> Result<PortfolioResponse, GatewayError>;
}

/// Opens sessions on demand.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Session type produced by this factory.
    type Session: InvestSession;

    /// Open a fresh session.
    async fn open(&self) -> Result<Self::Session, GatewayError>;
}

/// Session factory over HTTP/JSON.
///
/// Holds a pooled `reqwest::Client`; sessions share its connections.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    client: Client,
    token: Arc<str>,
    base_url: Arc<str>,
}

impl HttpSessionFactory {
    /// Create a factory from config.
    pub fn new(config: &TinkoffConfig) -> Result<Self, TinkoffError> {
        if config.token.trim().is_empty() {
            return Err(TinkoffError::MissingToken);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(app_name) = reqwest::header::HeaderValue::from_str(&config.app_name) {
            headers.insert("x-app-name", app_name);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TinkoffError::Http(e.to_string()))?;

        Ok(Self {
            client,
            token: Arc::from(config.token.trim()),
            base_url: Arc::from(config.base_url()),
        })
    }

    /// Gateway base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, GatewayError> {
        let session = HttpSession {
            id: Uuid::new_v4(),
            client: self.client.clone(),
            token: Arc::clone(&self.token),
            base_url: Arc::clone(&self.base_url),
        };
        tracing::debug!(session_id = %session.id, "Gateway session opened");
        Ok(session)
    }
}

/// Session bound to one call attempt.
pub struct HttpSession {
    id: Uuid,
    client: Client,
    token: Arc<str>,
    base_url: Arc<str>,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Session id, used in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    async fn call<B, T>(&self, service: &str, method: &str, body: &B) -> Result<T, TinkoffError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/rest/{CONTRACT_PREFIX}.{service}/{method}", self.base_url);
        tracing::debug!(session_id = %self.id, %service, %method, "Gateway request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| TinkoffError::from_reqwest(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TinkoffError::from_reqwest(&e))?;

        if !status.is_success() {
            return Err(TinkoffError::from_status(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| TinkoffError::JsonParse(e.to_string()))
    }
}

#[async_trait]
impl InvestSession for HttpSession {
    async fn get_accounts(&self) -> Result<GetAccountsResponse, GatewayError> {
        Ok(self
            .call("UsersService", "GetAccounts", &EmptyRequest::default())
            .await?)
    }

    async fn get_user_tariff(&self) -> Result<GetUserTariffResponse, GatewayError> {
        Ok(self
            .call("UsersService", "GetUserTariff", &EmptyRequest::default())
            .await?)
    }

    async fn get_info(&self) -> Result<GetInfoResponse, GatewayError> {
        Ok(self
            .call("UsersService", "GetInfo", &EmptyRequest::default())
            .await?)
    }

    async fn find_instrument(&self, query: &str) -> Result<FindInstrumentResponse, GatewayError> {
        let request = FindInstrumentRequest {
            query: query.to_string(),
        };
        Ok(self
            .call("InstrumentsService", "FindInstrument", &request)
            .await?)
    }

    async fn get_candles(
        &self,
        request: &GetCandlesRequest,
    ) -> Result<GetCandlesResponse, GatewayError> {
        Ok(self.call("MarketDataService", "GetCandles", request).await?)
    }

    async fn get_portfolio(&self, account_id: &str) -> Result<PortfolioResponse, GatewayError> {
        Ok(self
            .call(
                "OperationsService",
                "GetPortfolio",
                &PortfolioRequest::new(account_id),
            )
            .await?)
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        tracing::debug!(session_id = %self.id, "Gateway session closed");
    }
}
