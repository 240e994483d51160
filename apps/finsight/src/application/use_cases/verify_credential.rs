//! Verify Credential Use Case

use std::sync::Arc;

use crate::application::ports::InvestGatewayPort;

/// Use case probing whether the configured credential is accepted.
pub struct VerifyCredentialUseCase<G>
where
    G: InvestGatewayPort,
{
    gateway: Arc<G>,
}

impl<G> VerifyCredentialUseCase<G>
where
    G: InvestGatewayPort,
{
    /// Create a new `VerifyCredentialUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Run the probe. `debug` adds diagnostic logging.
    pub async fn execute(&self, debug: bool) -> bool {
        let valid = self.gateway.verify_credential(debug).await;
        if valid {
            tracing::info!("Brokerage credential verified");
        } else {
            tracing::warn!("Brokerage credential rejected or gateway unreachable");
        }
        valid
    }
}
