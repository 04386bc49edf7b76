use super::{run_section, ui};
use crate::AppCommand;
use crate::core::FundDataService;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "navdash", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    App(AppCommand),
    /// Drop cached fund listings so the next listing is fetched again
    Refresh {
        /// Drop every cached response, not only the listings
        #[arg(long)]
        all: bool,
    },
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// Runs one line of shell input against the shared service.
pub async fn handle_line(
    service: &FundDataService,
    config: &AppConfig,
    line: &str,
    today: NaiveDate,
) -> Result<Step> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Step::Continue);
    }

    let parsed = match ShellLine::try_parse_from(words) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Covers `help` and `--help` as well as typos
            e.print().context("Failed to print shell usage")?;
            return Ok(Step::Continue);
        }
    };
    debug!(command = ?parsed.command, "Shell command");

    match parsed.command {
        ShellCommand::Exit => return Ok(Step::Exit),
        ShellCommand::Refresh { all: false } => {
            let removed = service.refresh_listing().await;
            ui::print_notice(&format!("Cleared {removed} cached fund listing(s)."));
        }
        ShellCommand::Refresh { all: true } => {
            let removed = service.clear_cache().await;
            ui::print_notice(&format!("Cleared {removed} cached response(s)."));
        }
        ShellCommand::App(command) => {
            if let Err(e) = run_section(service, config, command, today).await {
                ui::print_warning(&format!("{e:#}"));
            }
        }
    }
    Ok(Step::Continue)
}

/// Interactive loop; the cache behind `service` lives for the whole session.
pub async fn run(service: &FundDataService, config: &AppConfig) -> Result<()> {
    println!(
        "{}",
        ui::style_text("navdash interactive shell", ui::StyleType::Title)
    );
    ui::print_notice("Commands: list, detail, compare, benchmark, refresh [--all], help, exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("navdash> ");
        std::io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let today = Local::now().date_naive();
        if handle_line(service, config, &line, today).await? == Step::Exit {
            break;
        }
    }
    println!();
    Ok(())
}
