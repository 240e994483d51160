//! Currency value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// ISO 4217 currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Russian rouble, the brokerage's base currency.
    #[must_use]
    pub fn rub() -> Self {
        Self("RUB".to_string())
    }

    /// Parse a three-letter currency code.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::invalid(
                "currency",
                format!("expected 3 letters, got '{code}'"),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Get the currency code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
