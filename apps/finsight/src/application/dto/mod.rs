//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case inputs/outputs.

mod historical_data;

pub use historical_data::HistoricalDataRequest;
