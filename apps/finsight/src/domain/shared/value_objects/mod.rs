//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod currency;
mod identifiers;
mod isin;
mod timestamp;

pub use currency::Currency;
pub use identifiers::{AccountId, InstrumentId};
pub use isin::Isin;
pub use timestamp::Timestamp;
