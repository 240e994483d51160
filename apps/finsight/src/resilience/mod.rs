//! Resilience patterns for external service calls.
//!
//! This module provides retry with exponential backoff for handling
//! transient failures of the brokerage gateway.

mod retry;

pub use retry::{
    Backoff, Classify, Retry, RetryConfigError, RetryError, RetryObserver, RetryPolicy,
    TracingRetryObserver,
};
