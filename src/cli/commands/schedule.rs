//! Schedule command - daily emailed briefing.

use crate::agent::{BriefingAgent, Toolbox};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::delivery::{build_email_body, subject_for, SmtpMailer};
use crate::models::Briefing;
use crate::scheduler::{parse_time, run_daily};
use anyhow::Result;
use chrono::Local;

/// Send the briefing every day at the configured time. Never returns on success.
pub async fn run_schedule(at: Option<&str>, compose: bool, settings: Settings) -> Result<()> {
    let at = parse_time(at.unwrap_or(&settings.schedule.time))?;

    let mut operations = vec![Operation::Send];
    if !compose {
        operations.push(Operation::Agent);
    }
    for operation in operations {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'brief doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    Output::info(&format!(
        "Sending the {} briefing daily at {}. Press Ctrl-C to stop.",
        if compose { "template" } else { "agent" },
        at.format("%H:%M")
    ));

    let settings = &settings;
    run_daily(at, move || async move { send_today(settings, compose).await }).await?;
    Ok(())
}

async fn send_today(settings: &Settings, compose: bool) -> crate::error::Result<()> {
    let date = Local::now().date_naive();

    let body = if compose {
        let tools = Toolbox::from_settings(settings)?;
        build_email_body(&Briefing::gather(&tools, date).await?)
    } else {
        BriefingAgent::from_settings(settings)?.run(date).await?.content
    };

    SmtpMailer::from_settings(&settings.email)?
        .send(&subject_for(date), &body)
        .await
}
