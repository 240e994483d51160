//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::ports::InvestGatewayPort;
use crate::application::use_cases::{GetAccountSummaryUseCase, GetPortfolioUseCase};
use crate::domain::shared::AccountId;
use crate::infrastructure::worker::DownloadQueue;

use super::middleware::request_id;
use super::request::DownloadCandlesRequest;
use super::response::{
    AccountSummaryResponse, ApiError, DownloadAcceptedResponse, HealthResponse, PortfolioResponse,
    SystemStatusResponse,
};

/// Application state shared across handlers.
pub struct AppState<G>
where
    G: InvestGatewayPort,
{
    /// Use case for the account summary.
    pub account_summary: Arc<GetAccountSummaryUseCase<G>>,
    /// Use case for portfolios.
    pub portfolio: Arc<GetPortfolioUseCase<G>>,
    /// Queue feeding the download worker.
    pub downloads: DownloadQueue,
    /// Application version.
    pub version: String,
}

impl<G> Clone for AppState<G>
where
    G: InvestGatewayPort,
{
    fn clone(&self) -> Self {
        Self {
            account_summary: Arc::clone(&self.account_summary),
            portfolio: Arc::clone(&self.portfolio),
            downloads: self.downloads.clone(),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<G>(state: AppState<G>) -> Router
where
    G: InvestGatewayPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/system/startup", get(system_status))
        .route("/system/readiness", get(system_status))
        .route("/system/liveness", get(system_status))
        .route("/api/v1/account/summary", get(account_summary))
        .route("/api/v1/account/{account_id}/portfolio", get(portfolio))
        .route("/api/v1/candles/download", post(download_candles))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check<G>(State(state): State<AppState<G>>) -> impl IntoResponse
where
    G: InvestGatewayPort,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Startup, readiness and liveness probes.
async fn system_status() -> Json<SystemStatusResponse> {
    Json(SystemStatusResponse {
        status: "ok".to_string(),
    })
}

async fn account_summary<G>(
    State(state): State<AppState<G>>,
) -> Result<Json<AccountSummaryResponse>, ApiError>
where
    G: InvestGatewayPort,
{
    let summary = state.account_summary.execute().await?;
    Ok(Json(summary.into()))
}

async fn portfolio<G>(
    State(state): State<AppState<G>>,
    Path(account_id): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError>
where
    G: InvestGatewayPort,
{
    let portfolio = state.portfolio.execute(&AccountId::new(account_id)).await?;
    Ok(Json(PortfolioResponse::from(&portfolio)))
}

async fn download_candles<G>(
    State(state): State<AppState<G>>,
    Json(request): Json<DownloadCandlesRequest>,
) -> Result<(StatusCode, Json<DownloadAcceptedResponse>), ApiError>
where
    G: InvestGatewayPort,
{
    let request = request.into_domain()?;
    let task_id = state.downloads.enqueue(request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DownloadAcceptedResponse {
            task_id: task_id.to_string(),
        }),
    ))
}
