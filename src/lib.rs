//! Brief - daily executive briefing generator
//!
//! Produces a short plain-text morning briefing from four data sources:
//! news headlines, calendar meetings, the weather forecast and overnight
//! market figures.
//!
//! # Overview
//!
//! Brief allows you to:
//! - Let a chat model gather data through function calls and write the briefing
//! - Render a fixed-template briefing straight from the sources
//! - Email either version over SMTP, once or every day
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `sources` - Data source adapters (RSS, Microsoft Graph, WeatherAPI, market data)
//! - `agent` - Function-calling loop over the sources
//! - `retry` - Bounded retry for tool invocations
//! - `delivery` - Email template and SMTP mailer
//! - `scheduler` - Daily run loop
//! - `logging` - Console and per-day file logging
//!
//! # Example
//!
//! ```rust,no_run
//! use brief_agent::agent::BriefingAgent;
//! use brief_agent::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let agent = BriefingAgent::from_settings(&settings)?;
//!
//!     let today = chrono::Local::now().date_naive();
//!     let report = agent.run(today).await?;
//!     println!("{}", report.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod models;
pub mod openai;
pub mod retry;
pub mod scheduler;
pub mod sources;

pub use error::{BriefError, Result};
