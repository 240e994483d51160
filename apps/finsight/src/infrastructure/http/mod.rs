//! HTTP/REST API adapter.
//!
//! Inbound adapter implementing REST endpoints that delegate to application use cases.

mod controller;
mod middleware;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use middleware::{REQUEST_ID_HEADER, request_id};
pub use request::*;
pub use response::*;
