//! Dependency Injection Container
//!
//! Wires the gateway and repository into use cases. Built once in `main`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{CandleRepositoryPort, InvestGatewayPort};
use crate::application::use_cases::{
    DownloadHistoricalCandlesUseCase, GetAccountSummaryUseCase, GetPortfolioUseCase,
    VerifyCredentialUseCase,
};
use crate::config::{Config, ConfigError};
use crate::infrastructure::persistence::InMemoryCandleRepository;
use crate::infrastructure::tinkoff::{TinkoffError, TinkoffGatewayAdapter};

/// Container used by the binary: Tinkoff over REST plus in-memory storage.
pub type ProductionContainer = Container<TinkoffGatewayAdapter, InMemoryCandleRepository>;

/// Errors building the production container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Configuration could not be turned into adapter settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The adapter refused its settings.
    #[error(transparent)]
    Tinkoff(#[from] TinkoffError),
}

/// Dependency injection container.
pub struct Container<G, R>
where
    G: InvestGatewayPort + 'static,
    R: CandleRepositoryPort + 'static,
{
    gateway: Arc<G>,
    candle_repo: Arc<R>,
}

impl<G, R> Clone for Container<G, R>
where
    G: InvestGatewayPort + 'static,
    R: CandleRepositoryPort + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            candle_repo: Arc::clone(&self.candle_repo),
        }
    }
}

impl<G, R> Container<G, R>
where
    G: InvestGatewayPort + 'static,
    R: CandleRepositoryPort + 'static,
{
    /// Create a new container with all dependencies.
    pub const fn new(gateway: Arc<G>, candle_repo: Arc<R>) -> Self {
        Self {
            gateway,
            candle_repo,
        }
    }

    /// Get the gateway port.
    pub fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway)
    }

    /// Get the candle repository.
    pub fn candle_repo(&self) -> Arc<R> {
        Arc::clone(&self.candle_repo)
    }

    /// Create a `GetAccountSummaryUseCase`.
    pub fn account_summary_use_case(&self) -> GetAccountSummaryUseCase<G> {
        GetAccountSummaryUseCase::new(self.gateway())
    }

    /// Create a `GetPortfolioUseCase`.
    pub fn portfolio_use_case(&self) -> GetPortfolioUseCase<G> {
        GetPortfolioUseCase::new(self.gateway())
    }

    /// Create a `DownloadHistoricalCandlesUseCase`.
    pub fn download_use_case(&self) -> DownloadHistoricalCandlesUseCase<G, R> {
        DownloadHistoricalCandlesUseCase::new(self.gateway(), self.candle_repo())
    }

    /// Create a `VerifyCredentialUseCase`.
    pub fn verify_credential_use_case(&self) -> VerifyCredentialUseCase<G> {
        VerifyCredentialUseCase::new(self.gateway())
    }
}

impl ProductionContainer {
    /// Build the Tinkoff adapter and an empty candle store from `config`.
    ///
    /// With a `shutdown` token, gateway calls still retrying when it fires
    /// are abandoned.
    pub fn from_config(
        config: &Config,
        shutdown: Option<CancellationToken>,
    ) -> Result<Self, ContainerError> {
        let tinkoff = config.tinkoff_config()?;
        tracing::info!(
            environment = %tinkoff.environment,
            base_url = %tinkoff.base_url(),
            "Wiring Tinkoff gateway"
        );
        let mut gateway = TinkoffGatewayAdapter::new(tinkoff)?;
        if let Some(shutdown) = shutdown {
            gateway = gateway.with_shutdown(shutdown);
        }
        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(InMemoryCandleRepository::new()),
        ))
    }
}
