pub mod compare;
pub mod detail;
pub mod list;
pub mod setup;
pub mod shell;
pub mod ui;

use crate::AppCommand;
use crate::core::FundDataService;
use crate::core::config::AppConfig;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

/// Renders one dashboard section. The interactive shell is started by the caller, not here.
pub async fn run_section(
    service: &FundDataService,
    config: &AppConfig,
    command: AppCommand,
    today: NaiveDate,
) -> Result<()> {
    debug!(?command, "Running section");
    match command {
        AppCommand::List { category, refresh } => list::run(service, category, refresh).await,
        AppCommand::Detail { code, period } => detail::run(service, &code, period).await,
        AppCommand::Compare { codes, from, to } => {
            compare::run_compare(service, config, &codes, from, to, today).await
        }
        AppCommand::Benchmark {
            funds,
            indices,
            from,
            to,
        } => compare::run_benchmark(service, config, &funds, &indices, from, to, today).await,
        AppCommand::Shell => {
            ui::print_notice("Already in the interactive shell.");
            Ok(())
        }
    }
}
