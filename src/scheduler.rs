//! Daily scheduling of the briefing job.

use crate::error::{BriefError, Result};
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use std::future::Future;
use tracing::{error, info};

/// Parse a wall-clock time given as `HH:MM`.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| BriefError::Config(format!("Invalid schedule time '{}': expected HH:MM", value)))
}

/// The next occurrence of `at` strictly after `now`.
///
/// A time skipped by a DST jump falls forward to the next day that has it;
/// an ambiguous time takes its earlier instant.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();

    loop {
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => return now.clone(),
        };
    }
}

/// Run `job` every day at local time `at`, forever.
///
/// Runs are sequential. A failed run is logged and the loop carries on.
pub async fn run_daily<F, Fut>(at: NaiveTime, mut job: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    loop {
        let now = Local::now();
        let next = next_run_after(&now, at);
        info!("Next briefing scheduled for {}", next.format("%Y-%m-%d %H:%M %Z"));

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        match job().await {
            Ok(()) => info!("Scheduled briefing finished"),
            Err(e) => error!("Scheduled briefing failed: {}", e),
        }
    }
}
