//! ISIN value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// ISO 6166 code length.
const ISIN_LENGTH: usize = 12;

/// International Securities Identification Number.
///
/// Twelve ASCII alphanumeric characters, stored uppercase. The brokerage
/// resolves it to its own instrument id (FIGI) before any market data call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isin(String);

impl Isin {
    /// Parse and normalize an ISIN.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.len() != ISIN_LENGTH || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid(
                "isin",
                format!("expected {ISIN_LENGTH} alphanumeric characters, got '{trimmed}'"),
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Get the ISIN string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Isin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isin {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isin> for String {
    fn from(isin: Isin) -> Self {
        isin.0
    }
}

impl fmt::Display for Isin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
