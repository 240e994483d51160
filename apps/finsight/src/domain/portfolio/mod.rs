//! Portfolio Bounded Context
//!
//! Account listings and per-account holdings.

mod account_summary;
mod portfolio;

pub use account_summary::AccountSummary;
pub use portfolio::{Portfolio, PortfolioPosition};
