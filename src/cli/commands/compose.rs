//! Compose command - fixed-template briefing without the model.

use crate::agent::Toolbox;
use crate::cli::preflight::{self, Operation};
use crate::cli::{resolve_date, Output};
use crate::config::Settings;
use crate::delivery::{build_email_body, subject_for, SmtpMailer};
use crate::models::Briefing;
use anyhow::Result;

/// Gather every source, render the template and optionally email it.
pub async fn run_compose(date: Option<&str>, send: bool, settings: Settings) -> Result<()> {
    let date = resolve_date(date)?;

    if send {
        if let Err(e) = preflight::check(Operation::Send, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'brief doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let tools = Toolbox::from_settings(&settings)?;
    let spinner = Output::spinner(&format!("Gathering data for {}...", date));
    let gathered = Briefing::gather(&tools, date).await;
    spinner.finish_and_clear();

    let briefing = gathered.inspect_err(|e| Output::error(&format!("Compose failed: {}", e)))?;
    let body = build_email_body(&briefing);
    println!("{}", body);

    if send {
        let mailer = SmtpMailer::from_settings(&settings.email)?;
        mailer.send(&subject_for(date), &body).await?;
        Output::success("Briefing sent.");
    }

    Ok(())
}
