//! Summary of the accounts visible to the current credential.

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// Count and ids of the user's brokerage accounts.
///
/// Only constructible from the ordered id list, so `accounts_count` always
/// equals `account_ids.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AccountSummaryRecord")]
pub struct AccountSummary {
    accounts_count: usize,
    account_ids: Vec<String>,
}

impl AccountSummary {
    /// Build a summary from account ids, keeping their order.
    #[must_use]
    pub fn from_ids(account_ids: Vec<String>) -> Self {
        Self {
            accounts_count: account_ids.len(),
            account_ids,
        }
    }

    /// Number of accounts.
    #[must_use]
    pub const fn accounts_count(&self) -> usize {
        self.accounts_count
    }

    /// Account ids in upstream order.
    #[must_use]
    pub fn account_ids(&self) -> &[String] {
        &self.account_ids
    }
}

#[derive(Deserialize)]
struct AccountSummaryRecord {
    accounts_count: usize,
    account_ids: Vec<String>,
}

impl TryFrom<AccountSummaryRecord> for AccountSummary {
    type Error = DomainError;

    fn try_from(record: AccountSummaryRecord) -> Result<Self, Self::Error> {
        if record.accounts_count != record.account_ids.len() {
            return Err(DomainError::invalid(
                "accounts_count",
                format!(
                    "{} does not match {} account ids",
                    record.accounts_count,
                    record.account_ids.len()
                ),
            ));
        }
        Ok(Self::from_ids(record.account_ids))
    }
}
