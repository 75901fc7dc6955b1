//! Configuration module for the briefing agent.
//!
//! Settings come from a TOML file with environment variable overrides.

mod settings;

pub use settings::{
    AgentSettings, CalendarSettings, EmailSettings, GeneralSettings, MarketSettings,
    NewsSettings, ScheduleSettings, Settings, WeatherSettings,
};
