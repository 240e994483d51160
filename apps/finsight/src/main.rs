//! FinSight Binary
//!
//! # Usage
//!
//! ```bash
//! finsight serve --config config.yaml
//! finsight fetch RU0009029540 2024-01-01 2024-01-31 --interval hour
//! finsight verify --debug
//! ```
//!
//! # Environment Variables
//!
//! - `APP_TINKOFF_INVEST_API_READONLY_TOKEN`: production read-only token
//! - `APP_TINKOFF_INVEST_API_SANDBOX_TOKEN`: sandbox token
//! - `RUST_LOG`: overrides the configured log level

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use finsight::cli::{Cli, Command};
use finsight::config::{Config, LoggingConfig, load_config};
use finsight::infrastructure::config::ProductionContainer;
use finsight::infrastructure::http::{AppState, create_router};
use finsight::infrastructure::worker::DownloadWorker;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Time the download worker gets to stop after the server exits.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command();

    if command == Command::Version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    load_dotenv();
    let config = load_config(Some(&cli.config))
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    init_tracing(&config.logging);

    tracing::info!(
        environment = %config.environment.mode,
        tinkoff = %config.tinkoff.environment(),
        "Starting FinSight"
    );

    // One-shot commands run their retries to completion.
    let shutdown = CancellationToken::new();
    let container = ProductionContainer::from_config(
        &config,
        (command == Command::Serve).then(|| shutdown.clone()),
    )?;

    match command {
        Command::Serve => serve(&config, &container, shutdown)
            .await
            .map(|()| ExitCode::SUCCESS),
        Command::Fetch { .. } => fetch(&command, &container).await.map(|()| ExitCode::SUCCESS),
        Command::Verify { debug } => Ok(verify(&container, debug).await),
        Command::Version => Ok(ExitCode::SUCCESS),
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    if logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn serve(
    config: &Config,
    container: &ProductionContainer,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    if !container.verify_credential_use_case().execute(false).await {
        tracing::warn!("Continuing without a verified credential");
    }

    let (downloads, worker) = DownloadWorker::new(
        Arc::new(container.download_use_case()),
        config.worker.queue_capacity,
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    let state = AppState {
        account_summary: Arc::new(container.account_summary_use_case()),
        portfolio: Arc::new(container.portfolio_use_case()),
        downloads,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let app = create_router(state);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;

    tracing::info!(%address, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/v1/account/summary");
    tracing::info!("  GET  /api/v1/account/{{account_id}}/portfolio");
    tracing::info!("  POST /api/v1/candles/download");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await
        .context("HTTP server error")?;

    shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, worker_handle).await {
        Ok(Ok(report)) => tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Download worker stopped"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "Download worker panicked"),
        Err(_) => tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Download worker did not stop in time"
        ),
    }

    tracing::info!("FinSight stopped");
    Ok(())
}

async fn fetch(command: &Command, container: &ProductionContainer) -> anyhow::Result<()> {
    let Some(request) = command.fetch_request() else {
        anyhow::bail!("not a fetch command");
    };
    let request = request?;

    let stored = container.download_use_case().execute(&request).await?;
    println!("Stored {stored} candles for {}", request.isin);
    Ok(())
}

async fn verify(container: &ProductionContainer, debug: bool) -> ExitCode {
    if container.verify_credential_use_case().execute(debug).await {
        println!("Token is valid");
        ExitCode::SUCCESS
    } else {
        println!("Token is invalid or the gateway is unreachable");
        ExitCode::FAILURE
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
