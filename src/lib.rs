pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{CategoryFilter, FundDataService, Lookback};
use crate::providers::{FmarketProvider, VciIndexProvider};
use crate::store::MemoryStore;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum AppCommand {
    /// List funds with their latest NAV and trailing growth
    List {
        /// Fund category: all, equity, bond or balanced
        #[arg(long, default_value_t = CategoryFilter::All)]
        category: CategoryFilter,
        /// Fetch the listing again instead of using the cached copy
        #[arg(short, long)]
        refresh: bool,
    },
    /// Show NAV history and portfolio composition of one fund
    Detail {
        /// Fund short code, e.g. VESAF
        code: String,
        /// Growth window: 3m, 6m, 12m, 36m or all
        #[arg(short, long, default_value = "12m")]
        period: Lookback,
    },
    /// Compare cumulative returns of funds
    Compare {
        /// Fund short codes (at most 5)
        #[arg(required = true)]
        codes: Vec<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date, YYYY-MM-DD (default: today)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Compare funds against market indices
    Benchmark {
        /// Comma-separated fund short codes (at most 5)
        #[arg(short, long, value_delimiter = ',')]
        funds: Vec<String>,
        /// Comma-separated index symbols (at most 5)
        #[arg(short, long, value_delimiter = ',')]
        indices: Vec<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date, YYYY-MM-DD (default: today)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Start an interactive session that keeps fetched data cached
    Shell,
}

/// Wires the configured providers and an in-memory cache into a data service.
pub fn build_service(config: &AppConfig) -> Result<FundDataService> {
    let funds = FmarketProvider::new(config.fmarket_url())?;
    let indices = VciIndexProvider::new(config.vci_url())?;
    Ok(FundDataService::new(
        Arc::new(funds),
        Arc::new(indices),
        Arc::new(MemoryStore::new()),
        config.cache.clone(),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("navdash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config)?;
    match command {
        AppCommand::Shell => cli::shell::run(&service, &config).await,
        command => {
            cli::run_section(&service, &config, command, Local::now().date_naive()).await
        }
    }
}
