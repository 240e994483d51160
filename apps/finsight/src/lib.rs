// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! FinSight - Tinkoff Invest gateway
//!
//! Read-only access to Tinkoff Invest accounts, portfolios and historical
//! candles, with transient failures retried under exponential backoff.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Value objects and entities
//!   - `shared`: ISIN, identifiers, currency, timestamps
//!   - `market_data`: Candles and candle intervals
//!   - `portfolio`: Account summary, positions, portfolio
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `InvestGatewayPort`, `CandleRepositoryPort`
//!   - `use_cases`: account summary, portfolio, candle download, credential check
//!   - `dto`: Download requests
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `tinkoff`: REST gateway adapter with per-attempt sessions
//!   - `persistence`: In-memory candle repository
//!   - `worker`: Background download queue
//!   - `http`: REST API
//!   - `config`: Dependency injection container
//!
//! - **Resilience**: Retry with exponential backoff

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Command-line interface.
pub mod cli;

/// Configuration loading and validation.
pub mod config;

/// Retry with exponential backoff.
pub mod resilience;

// =============================================================================
// Re-exports
// =============================================================================

pub use domain::market_data::{Candle, CandleInterval};
pub use domain::portfolio::{AccountSummary, Portfolio, PortfolioPosition};
pub use domain::shared::{AccountId, Currency, DomainError, InstrumentId, Isin, Timestamp};

pub use application::dto::HistoricalDataRequest;
pub use application::ports::{
    CandleRepositoryPort, FailureKind, GatewayError, InvestGatewayPort, RepositoryError,
};
pub use application::use_cases::{
    DownloadError, DownloadHistoricalCandlesUseCase, GetAccountSummaryUseCase,
    GetPortfolioUseCase, VerifyCredentialUseCase,
};

pub use infrastructure::config::{Container, ProductionContainer};
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::InMemoryCandleRepository;
pub use infrastructure::tinkoff::{TinkoffConfig, TinkoffEnvironment, TinkoffGatewayAdapter};
pub use resilience::{Retry, RetryPolicy};
