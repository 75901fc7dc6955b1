//! Data source abstraction.
//!
//! Each source wraps one external API and maps its response into a record
//! from [`crate::models`]. Sources hold no state between calls apart from the
//! calendar's credential store.

mod calendar;
mod market;
mod news;
mod token_store;
mod weather;

pub use calendar::GraphCalendar;
pub use market::MarketData;
pub use news::RssNews;
pub use token_store::{CachedToken, FileTokenStore, MemoryTokenStore, TokenStore};
pub use weather::WeatherApi;

use crate::error::{BriefError, Result};
use crate::models::{Financials, Headline, Meeting, Weather};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of news headlines.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch up to `page_size` headlines for the date.
    async fn headlines(
        &self,
        iso_date: &str,
        query: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Vec<Headline>>;
}

/// Source of calendar meetings.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Fetch the meetings scheduled on the date (UTC window).
    async fn meetings(&self, iso_date: &str) -> Result<Vec<Meeting>>;
}

/// Source of weather forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the one-day forecast for the configured location.
    async fn forecast(&self, iso_date: &str) -> Result<Weather>;
}

/// Source of market data.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch the AUD/USD rate and the NASDAQ previous close.
    async fn financials(&self) -> Result<Financials>;
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn validate_iso_date(iso_date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(iso_date, "%Y-%m-%d")
        .ok()
        .filter(|_| iso_date.len() == 10)
        .ok_or_else(|| BriefError::InvalidDate(iso_date.to_string()))
}

/// Turn a non-success HTTP status into a provider error.
async fn ensure_success(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BriefError::Provider(format!(
        "{} returned {}: {}",
        what,
        status,
        body.chars().take(200).collect::<String>()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_iso_date() {
        assert_eq!(
            validate_iso_date("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(
            validate_iso_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_validate_iso_date_rejects_malformed() {
        for bad in [
            "",
            "today",
            "2024-13-01",
            "2023-02-29",
            "2024/05/01",
            "01-05-2024",
            "2024-5-1",
            "2024-05-01T00:00:00",
            " 2024-05-01",
        ] {
            assert!(
                matches!(validate_iso_date(bad), Err(BriefError::InvalidDate(_))),
                "expected rejection for {:?}",
                bad
            );
        }
    }
}
