//! Tinkoff gateway adapter implementing InvestGatewayPort.

use std::future::Future;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{GatewayError, InvestGatewayPort};
use crate::domain::market_data::{Candle, CandleInterval};
use crate::domain::portfolio::{AccountSummary, Portfolio};
use crate::domain::shared::{AccountId, Isin};
use crate::resilience::Retry;

use super::api_types::{
    GetAccountsResponse, GetCandlesRequest, PortfolioPositionDto, accounts_to_summary,
};
use super::config::{TinkoffConfig, TinkoffEnvironment};
use super::error::TinkoffError;
use super::session::{HttpSessionFactory, InvestSession, SessionFactory};

/// Tinkoff Invest gateway adapter.
///
/// Every network-facing operation runs through [`Retry`]; every attempt
/// opens its own session. With a shutdown token, calls stop with
/// [`GatewayError::Cancelled`] once it fires instead of waiting out their
/// retries.
#[derive(Debug, Clone)]
pub struct TinkoffGatewayAdapter<F = HttpSessionFactory> {
    factory: F,
    retry: Retry,
    environment: TinkoffEnvironment,
    shutdown: Option<CancellationToken>,
}

impl TinkoffGatewayAdapter<HttpSessionFactory> {
    /// Create an adapter talking HTTP to the configured environment.
    pub fn new(config: TinkoffConfig) -> Result<Self, TinkoffError> {
        let retry = Retry::new(config.retry.clone())?;
        let factory = HttpSessionFactory::new(&config)?;
        Ok(Self::with_factory(factory, retry, config.environment))
    }
}

impl<F: SessionFactory> TinkoffGatewayAdapter<F> {
    /// Create an adapter over an arbitrary session factory.
    pub fn with_factory(factory: F, retry: Retry, environment: TinkoffEnvironment) -> Self {
        Self {
            factory,
            retry,
            environment,
            shutdown: None,
        }
    }

    /// Abandon in-flight calls and their retries when `shutdown` fires.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run one gateway call under the retry policy.
    async fn call<T, Op, Fut>(&self, operation: Op) -> Result<T, GatewayError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        match &self.shutdown {
            Some(token) => self
                .retry
                .run_cancellable(token, operation)
                .await
                .map_err(GatewayError::from),
            None => self.retry.run(operation).await,
        }
    }

    /// Environment the adapter talks to.
    #[must_use]
    pub const fn environment(&self) -> TinkoffEnvironment {
        self.environment
    }

    async fn probe(&self, debug: bool) -> Result<(), GatewayError> {
        let session = self.factory.open().await?;
        let accounts = session.get_accounts().await?;
        if debug {
            self.log_diagnostics(&session, &accounts).await;
        }
        Ok(())
    }

    async fn log_diagnostics(&self, session: &F::Session, accounts: &GetAccountsResponse) {
        tracing::info!(environment = %self.environment, "Token diagnostics started");

        for account in &accounts.accounts {
            tracing::info!(
                account_id = %account.id,
                name = %account.name,
                account_type = %account.account_type,
                status = %account.status,
                access_level = %account.access_level,
                "Account"
            );
        }

        if let Err(err) = Self::log_limits(session).await {
            tracing::warn!(error = %err, "Failed to collect token diagnostics");
        }

        tracing::info!("Token diagnostics finished");
    }

    async fn log_limits(session: &F::Session) -> Result<(), GatewayError> {
        let tariff = session.get_user_tariff().await?;
        for limit in &tariff.unary_limits {
            tracing::info!(
                limit_per_minute = limit.limit_per_minute,
                methods = %limit.methods.join(", "),
                "Unary limit"
            );
        }
        for limit in &tariff.stream_limits {
            tracing::info!(
                limit = limit.limit,
                open = limit.open,
                streams = %limit.streams.join(", "),
                "Stream limit"
            );
        }

        let info = session.get_info().await?;
        tracing::info!(
            tariff = %info.tariff,
            prem_status = info.prem_status,
            qual_status = info.qual_status,
            qualified_for_work_with = %info.qualified_for_work_with.join(", "),
            "User info"
        );
        Ok(())
    }
}

#[async_trait]
impl<F: SessionFactory> InvestGatewayPort for TinkoffGatewayAdapter<F> {
    async fn get_account_summary(&self) -> Result<AccountSummary, GatewayError> {
        let factory = &self.factory;
        self.call(move || async move {
            let session = factory.open().await?;
            let response = session.get_accounts().await?;
            Ok::<_, GatewayError>(accounts_to_summary(&response.accounts))
        })
        .await
    }

    async fn get_candles(
        &self,
        isin: &Isin,
        from: NaiveDate,
        to: NaiveDate,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, GatewayError> {
        tracing::info!(%isin, %from, %to, %interval, "Fetching candles");

        let factory = &self.factory;
        let candles = self
            .call(move || async move {
                let session = factory.open().await?;

                let found = session.find_instrument(isin.as_str()).await?;
                let figi = found
                    .best_match(isin.as_str())
                    .map(|instrument| instrument.figi.clone())
                    .ok_or_else(|| GatewayError::InstrumentNotFound {
                        isin: isin.to_string(),
                    })?;

                let request = GetCandlesRequest::new(&figi, from, to, interval);
                let response = session.get_candles(&request).await?;

                response
                    .candles
                    .iter()
                    .map(|candle| candle.to_candle(&figi, interval))
                    .collect::<Result<Vec<_>, GatewayError>>()
            })
            .await?;

        tracing::info!(%isin, count = candles.len(), "Candles fetched");
        Ok(candles)
    }

    async fn get_portfolio(&self, account_id: &AccountId) -> Result<Portfolio, GatewayError> {
        let factory = &self.factory;
        self.call(move || async move {
            let session = factory.open().await?;
            let response = session.get_portfolio(account_id.as_str()).await?;
            let positions = response
                .positions
                .iter()
                .map(PortfolioPositionDto::to_position)
                .collect::<Result<Vec<_>, _>>()?;
            Portfolio::new(account_id.clone(), response.currency(), positions).map_err(|e| {
                GatewayError::InvalidResponse {
                    message: e.to_string(),
                }
            })
        })
        .await
    }

    async fn verify_credential(&self, debug: bool) -> bool {
        match self.probe(debug).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Token verification failed");
                false
            }
        }
    }
}
