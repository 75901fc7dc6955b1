//! Brief CLI entry point.

use anyhow::Result;
use brief_agent::cli::{commands, Cli, Commands};
use brief_agent::config::Settings;
use brief_agent::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_ref()
        .map(|p| Settings::expand_path(p))
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let level = logging::level_for(cli.verbose, &settings.general.log_level);
    logging::init(&settings.log_dir(), &level)?;

    // Execute command
    let command = cli.command.unwrap_or(Commands::Run {
        date: None,
        send: false,
    });

    match command {
        Commands::Run { date, send } => {
            commands::run_briefing(date.as_deref(), send, settings).await?;
        }

        Commands::Compose { date, send } => {
            commands::run_compose(date.as_deref(), send, settings).await?;
        }

        Commands::Schedule { at, compose } => {
            commands::run_schedule(at.as_deref(), compose, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, &config_path)?;
        }
    }

    Ok(())
}
