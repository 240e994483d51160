//! Get Account Summary Use Case

use std::sync::Arc;

use crate::application::ports::{GatewayError, InvestGatewayPort};
use crate::domain::portfolio::AccountSummary;

/// Use case for listing the user's accounts.
pub struct GetAccountSummaryUseCase<G>
where
    G: InvestGatewayPort,
{
    gateway: Arc<G>,
}

impl<G> GetAccountSummaryUseCase<G>
where
    G: InvestGatewayPort,
{
    /// Create a new `GetAccountSummaryUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Fetch the account summary.
    pub async fn execute(&self) -> Result<AccountSummary, GatewayError> {
        let summary = self.gateway.get_account_summary().await?;
        tracing::debug!(accounts_count = summary.accounts_count(), "Account summary fetched");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::stub_gateway::StubGateway;

    #[tokio::test]
    async fn returns_gateway_summary() {
        let gateway = StubGateway {
            summary: Ok(AccountSummary::from_ids(vec!["a".into(), "b".into()])),
            ..StubGateway::default()
        };
        let use_case = GetAccountSummaryUseCase::new(Arc::new(gateway));

        let summary = use_case.execute().await.unwrap();
        assert_eq!(summary.accounts_count(), 2);
        assert_eq!(summary.account_ids(), ["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn propagates_gateway_error() {
        let gateway = StubGateway {
            summary: Err(GatewayError::Unauthorized {
                message: "expired".to_string(),
            }),
            ..StubGateway::default()
        };
        let use_case = GetAccountSummaryUseCase::new(Arc::new(gateway));

        let err = use_case.execute().await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized { .. }));
    }
}
