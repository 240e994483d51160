//! Domain errors for the FinSight gateway.

use std::fmt;

/// Domain-level errors raised while building value objects and records.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// A date range whose start lies after its end.
    InvalidRange {
        /// Range start as written by the caller.
        from: String,
        /// Range end as written by the caller.
        to: String,
    },
}

impl DomainError {
    /// Shorthand for an [`DomainError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::InvalidRange { from, to } => {
                write!(f, "Invalid range: {from} is after {to}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
