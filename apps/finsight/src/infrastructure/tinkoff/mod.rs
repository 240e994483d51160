//! Tinkoff Invest Gateway Adapter
//!
//! Implementation of `InvestGatewayPort` over the Tinkoff Invest REST gateway:
//! - Scoped session per call attempt, torn down on every exit path
//! - Retry with exponential backoff on transport-level failures
//! - Exact units+nano price reconstruction into `Decimal`
//! - Production and sandbox environments

mod adapter;
pub mod api_types;
mod config;
mod error;
mod session;

pub use adapter::TinkoffGatewayAdapter;
pub use config::{TinkoffConfig, TinkoffEnvironment};
pub use error::TinkoffError;
pub use session::{HttpSession, HttpSessionFactory, InvestSession, SessionFactory};
