//! Get Portfolio Use Case

use std::sync::Arc;

use crate::application::ports::{GatewayError, InvestGatewayPort};
use crate::domain::portfolio::Portfolio;
use crate::domain::shared::AccountId;

/// Use case for fetching the holdings of one account.
pub struct GetPortfolioUseCase<G>
where
    G: InvestGatewayPort,
{
    gateway: Arc<G>,
}

impl<G> GetPortfolioUseCase<G>
where
    G: InvestGatewayPort,
{
    /// Create a new `GetPortfolioUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Fetch the portfolio of `account_id`.
    pub async fn execute(&self, account_id: &AccountId) -> Result<Portfolio, GatewayError> {
        let portfolio = self.gateway.get_portfolio(account_id).await?;
        tracing::debug!(
            account_id = %account_id,
            positions = portfolio.positions().len(),
            total_value = %portfolio.total_value(),
            "Portfolio fetched"
        );
        Ok(portfolio)
    }
}
