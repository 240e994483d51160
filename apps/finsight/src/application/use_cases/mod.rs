//! Application Use Cases
//!
//! Use cases orchestrate gateway calls to fulfill application requirements.

mod download_historical_candles;
mod get_account_summary;
mod get_portfolio;
mod verify_credential;

pub use download_historical_candles::{DownloadError, DownloadHistoricalCandlesUseCase};
pub use get_account_summary::GetAccountSummaryUseCase;
pub use get_portfolio::GetPortfolioUseCase;
pub use verify_credential::VerifyCredentialUseCase;
