//! CLI module for the briefing agent.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::error::Result;
use crate::sources::validate_iso_date;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

/// Brief - daily executive briefing generator
///
/// Gathers headlines, meetings, weather and market figures through an LLM
/// function-calling loop and optionally emails the result.
#[derive(Parser, Debug)]
#[command(name = "brief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the briefing with the agent and print it
    Run {
        /// Briefing date (YYYY-MM-DD), today if omitted
        #[arg(short, long)]
        date: Option<String>,

        /// Email the briefing to the configured recipient
        #[arg(short, long)]
        send: bool,
    },

    /// Render the fixed-template briefing without the model
    Compose {
        /// Briefing date (YYYY-MM-DD), today if omitted
        #[arg(short, long)]
        date: Option<String>,

        /// Email the briefing to the configured recipient
        #[arg(short, long)]
        send: bool,
    },

    /// Generate and email the briefing every day
    Schedule {
        /// Local time to run at (HH:MM), overrides the config
        #[arg(long)]
        at: Option<String>,

        /// Send the fixed-template briefing instead of the agent's
        #[arg(long)]
        compose: bool,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration, secrets masked
    Show,

    /// Show configuration file path
    Path,
}

/// The requested briefing date, or today's local date.
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => validate_iso_date(d),
        None => Ok(Local::now().date_naive()),
    }
}
