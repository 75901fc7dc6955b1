//! Run command - agent-written briefing.

use crate::agent::BriefingAgent;
use crate::cli::output::preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::{resolve_date, Output};
use crate::config::Settings;
use crate::delivery::{subject_for, SmtpMailer};
use anyhow::Result;

/// Run the agent for a date, print the briefing and optionally email it.
pub async fn run_briefing(date: Option<&str>, send: bool, settings: Settings) -> Result<()> {
    let date = resolve_date(date)?;

    // Pre-flight checks
    let mut operations = vec![Operation::Agent];
    if send {
        operations.push(Operation::Send);
    }
    for operation in operations {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'brief doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let agent = BriefingAgent::from_settings(&settings)?;
    let spinner = Output::spinner(&format!("Preparing briefing for {}...", date));

    let report = match agent.run(date).await {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Briefing failed: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}\n", report.content);

    if !report.tool_calls.is_empty() {
        Output::info(&format!("Tool calls ({}):", report.tool_calls.len()));
        for call in &report.tool_calls {
            Output::list_item(&format!("{} {}", call.name, preview(&call.arguments, 60)));
        }
    }
    Output::info(&format!("Completed in {} turn(s)", report.turns));

    if send {
        let mailer = SmtpMailer::from_settings(&settings.email)?;
        mailer.send(&subject_for(date), &report.content).await?;
        Output::success("Briefing sent.");
    }

    Ok(())
}
