//! Plain-text rendering of a [`Briefing`].

use crate::agent::Toolbox;
use crate::error::Result;
use crate::models::Briefing;
use crate::retry::{retry, RetryPolicy};
use chrono::NaiveDate;
use std::fmt::Write;
use tracing::info;

/// Subject line for the briefing email.
pub fn subject_for(date: NaiveDate) -> String {
    format!("Executive Daily Briefing - {}", date.format("%Y-%m-%d"))
}

/// Render the briefing into the fixed email template.
///
/// Meeting times are shown in UTC.
pub fn build_email_body(briefing: &Briefing) -> String {
    let mut body = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(body, "{}", subject_for(briefing.date));
    let _ = writeln!(body, "{}", "=".repeat(40));
    let _ = writeln!(body);

    let _ = writeln!(body, "Headlines:");
    for headline in &briefing.headlines {
        let _ = writeln!(body, "- {} ({})", headline.title, headline.url);
    }
    let _ = writeln!(body);

    let _ = writeln!(body, "Meetings:");
    for meeting in &briefing.meetings {
        let _ = writeln!(
            body,
            "- {}-{}: {}",
            meeting.start.format("%H:%M"),
            meeting.end.format("%H:%M"),
            meeting.summary
        );
    }
    let _ = writeln!(body);

    let weather = &briefing.weather;
    let _ = writeln!(
        body,
        "Weather: {:.1}°C - {:.1}°C, Rain chance: {}%",
        weather.min_c, weather.max_c, weather.rain_chance_pct
    );
    let _ = writeln!(body, "AUD -> USD: {:.4}", briefing.aud_usd);
    let _ = write!(body, "NASDAQ previous close: {}", briefing.nasdaq_close);

    body
}

impl Briefing {
    /// Collect every section straight from the sources, without the model.
    pub async fn gather(tools: &Toolbox, date: NaiveDate) -> Result<Briefing> {
        let iso_date = date.format("%Y-%m-%d").to_string();
        let policy = RetryPolicy::default();

        let headlines = retry(policy, "get_headlines", || {
            tools.news().headlines(&iso_date, None, None)
        })
        .await?;
        let meetings = retry(policy, "get_meetings", || tools.calendar().meetings(&iso_date)).await?;
        let weather = retry(policy, "get_weather", || tools.weather().forecast(&iso_date)).await?;
        let market = retry(policy, "get_financials", || tools.market().financials()).await?;

        info!(
            "Gathered {} headline(s) and {} meeting(s) for {}",
            headlines.len(),
            meetings.len(),
            iso_date
        );

        Ok(Briefing {
            date,
            headlines,
            meetings,
            weather,
            aud_usd: market.aud_usd,
            nasdaq_close: market.nasdaq_close,
        })
    }
}
