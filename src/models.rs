//! Record types produced by the data sources.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
}

/// A calendar meeting, in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
}

/// One-day weather forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub min_c: f64,
    pub max_c: f64,
    /// Probability of rain, 0-100.
    pub rain_chance_pct: u8,
}

/// Overnight market figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub aud_usd: f64,
    pub nasdaq_close: f64,
}

/// Everything needed to render the fixed-template email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Briefing {
    pub date: NaiveDate,
    pub headlines: Vec<Headline>,
    pub meetings: Vec<Meeting>,
    pub weather: Weather,
    pub aud_usd: f64,
    pub nasdaq_close: f64,
}
