use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use navdash::cli::setup;
use navdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log progress to stderr; repeat (-vv) to include HTTP client events
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    #[command(flatten)]
    App(navdash::AppCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup::setup_at_path(path),
            None => setup::setup(),
        },
        Some(Commands::App(cmd)) => navdash::run_command(cmd, cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
