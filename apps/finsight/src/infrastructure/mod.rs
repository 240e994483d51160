//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `tinkoff/`: Tinkoff Invest REST gateway
//!   - `persistence/`: Candle storage
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: REST API controllers
//!   - `worker/`: Background download queue
//!
//! - `config/`: Dependency injection container

pub mod config;
pub mod http;
pub mod persistence;
pub mod tinkoff;
pub mod worker;
