//! Domain Layer
//!
//! The innermost layer containing business records with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Records**: Immutable results of gateway calls (candles, portfolios)
//!
//! # Bounded Contexts
//!
//! - [`market_data`]: Historical candles and aggregation intervals
//! - [`portfolio`]: Account summaries and holdings

pub mod market_data;
pub mod portfolio;
pub mod shared;
