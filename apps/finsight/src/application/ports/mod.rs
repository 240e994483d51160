//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems

mod candle_repository_port;
mod invest_gateway_port;
#[cfg(test)]
pub(crate) mod stub_gateway;

#[cfg(test)]
pub use candle_repository_port::MockCandleRepositoryPort;
pub use candle_repository_port::{CandleRepositoryPort, RepositoryError};
pub use invest_gateway_port::{FailureKind, GatewayError, InvestGatewayPort};
