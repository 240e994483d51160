//! Portfolio aggregate and its positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, Currency, DomainError, InstrumentId};

/// A single holding inside an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    /// Instrument FIGI.
    pub instrument_id: InstrumentId,
    /// Instrument type as reported upstream (`share`, `bond`, `etf`, ...).
    pub instrument_type: String,
    /// Held quantity.
    pub quantity: Decimal,
    /// Expected yield.
    pub expected_yield: Decimal,
    /// Average acquisition price.
    pub average_price: Decimal,
    /// Current market price.
    pub current_price: Decimal,
    /// `current_price × quantity`.
    pub value: Decimal,
    /// Instrument uid.
    pub instrument_uid: String,
}

/// Holdings of one account.
///
/// `total_value` is computed from the positions at construction and is the
/// only total the system reports. Deserialized totals must match the positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PortfolioRecord")]
pub struct Portfolio {
    account_id: AccountId,
    total_value: Decimal,
    currency: Currency,
    positions: Vec<PortfolioPosition>,
}

impl Portfolio {
    /// Build a portfolio, summing position values into `total_value`.
    ///
    /// Fails when the sum leaves the `Decimal` range.
    pub fn new(
        account_id: AccountId,
        currency: Currency,
        positions: Vec<PortfolioPosition>,
    ) -> Result<Self, DomainError> {
        let total_value = positions
            .iter()
            .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.value))
            .ok_or_else(|| DomainError::invalid("total_value", "sum of position values overflows"))?;
        Ok(Self {
            account_id,
            total_value,
            currency,
            positions,
        })
    }

    /// Account the portfolio belongs to.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Sum of position values.
    #[must_use]
    pub const fn total_value(&self) -> Decimal {
        self.total_value
    }

    /// Portfolio currency.
    #[must_use]
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Positions in upstream order.
    #[must_use]
    pub fn positions(&self) -> &[PortfolioPosition] {
        &self.positions
    }
}

/// Serialized form of [`Portfolio`].
#[derive(Deserialize)]
struct PortfolioRecord {
    account_id: AccountId,
    total_value: Decimal,
    currency: Currency,
    positions: Vec<PortfolioPosition>,
}

impl TryFrom<PortfolioRecord> for Portfolio {
    type Error = DomainError;

    fn try_from(record: PortfolioRecord) -> Result<Self, Self::Error> {
        let portfolio = Self::new(record.account_id, record.currency, record.positions)?;
        if portfolio.total_value != record.total_value {
            return Err(DomainError::invalid(
                "total_value",
                format!(
                    "{} does not match the position sum {}",
                    record.total_value, portfolio.total_value
                ),
            ));
        }
        Ok(portfolio)
    }
}
