//! Command-line interface.

use clap::{Parser, Subcommand};

use crate::application::dto::HistoricalDataRequest;
use crate::domain::shared::DomainError;

/// Tinkoff Invest gateway with a REST surface.
#[derive(Debug, Parser)]
#[command(name = "finsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: String,

    /// Command to run. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Selected command, `serve` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server and the download worker.
    Serve,

    /// Download candles once and print how many were stored.
    Fetch {
        /// Instrument ISIN, e.g. RU0009029540.
        isin: String,
        /// First day, YYYY-MM-DD.
        from: String,
        /// Last day, YYYY-MM-DD.
        to: String,
        /// Candle interval (5min, hour, day, week, month).
        #[arg(long, default_value = "day")]
        interval: String,
    },

    /// Check that the configured token is accepted. Exits 1 when it is not.
    Verify {
        /// Log accounts and tariff limits.
        #[arg(long)]
        debug: bool,
    },

    /// Print name and version.
    Version,
}

impl Command {
    /// Validated download request of a `fetch` command.
    pub fn fetch_request(&self) -> Option<Result<HistoricalDataRequest, DomainError>> {
        match self {
            Self::Fetch {
                isin,
                from,
                to,
                interval,
            } => Some(HistoricalDataRequest::parse(isin, from, to, Some(interval))),
            _ => None,
        }
    }
}
