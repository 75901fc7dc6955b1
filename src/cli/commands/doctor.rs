//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::delivery::SmtpMailer;
use crate::scheduler::parse_time;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Brief Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let sections = [
        (
            "Model",
            vec![check_openai_api_key(std::env::var("OPENAI_API_KEY").ok())],
        ),
        ("Data Sources", check_sources(settings)),
        ("Delivery", vec![check_email(settings), check_schedule(settings)]),
        ("Files", check_files(settings, config_path)),
    ];

    let mut checks = Vec::new();
    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the briefing.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Brief is ready to use.");
    }

    Ok(())
}

/// First seven and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the credentials each data source needs.
fn check_sources(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let calendar = &settings.calendar;
    if calendar.disabled {
        results.push(CheckResult::warning(
            "Calendar",
            "disabled",
            "Unset CI / BRIEF_SKIP_CALENDAR to include meetings",
        ));
    } else if calendar.client_id.is_none() || calendar.tenant_id.is_none() {
        results.push(CheckResult::error(
            "Calendar",
            "AZURE_CLIENT_ID / AZURE_TENANT_ID not set",
            "Register an app in Entra ID and export both variables",
        ));
    } else if calendar.client_secret.is_some() && calendar.user.is_none() {
        results.push(CheckResult::error(
            "Calendar",
            "client secret set without calendar.user",
            "Set calendar.user to the mailbox to read",
        ));
    } else if calendar.client_secret.is_some() {
        results.push(CheckResult::ok("Calendar", "client credentials"));
    } else {
        results.push(CheckResult::ok(
            "Calendar",
            "device code sign-in (cached after first run)",
        ));
    }

    if settings.weather.api_key.is_some() {
        results.push(CheckResult::ok(
            "WEATHER_API_KEY",
            &format!("configured for {}", settings.weather.location),
        ));
    } else {
        results.push(CheckResult::error(
            "WEATHER_API_KEY",
            "not set",
            "Get a key from weatherapi.com and export WEATHER_API_KEY",
        ));
    }

    if settings.market.api_key.is_some() {
        results.push(CheckResult::ok("FMP_API_KEY", "Financial Modeling Prep"));
    } else {
        results.push(CheckResult::warning(
            "FMP_API_KEY",
            "not set, using keyless providers",
            "Export FMP_API_KEY to use Financial Modeling Prep",
        ));
    }

    results
}

/// Check SMTP settings. Only needed for sending.
fn check_email(settings: &Settings) -> CheckResult {
    match SmtpMailer::from_settings(&settings.email) {
        Ok(mailer) => CheckResult::ok(
            "SMTP",
            &format!(
                "{}:{}",
                settings.email.smtp_host.as_deref().unwrap_or_default(),
                mailer.port()
            ),
        ),
        Err(e) => CheckResult::warning(
            "SMTP",
            &e.to_string(),
            "Set SMTP_HOST, SMTP_USER, SMTP_PASS and RECIPIENT to email the briefing",
        ),
    }
}

fn check_schedule(settings: &Settings) -> CheckResult {
    match parse_time(&settings.schedule.time) {
        Ok(at) => CheckResult::ok("Schedule", &format!("daily at {}", at.format("%H:%M"))),
        Err(e) => CheckResult::error("Schedule", &e.to_string(), "Use HH:MM, e.g. 06:30"),
    }
}

fn check_files(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if config_path.exists() {
        results.push(CheckResult::ok(
            "Config file",
            &format!("{}", config_path.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Config file",
            "using defaults",
            "Environment variables are enough; a config file is optional",
        ));
    }

    let log_dir = settings.log_dir();
    results.push(CheckResult::ok(
        "Log directory",
        &format!("{}", log_dir.display()),
    ));

    if !settings.calendar.disabled {
        let cache = settings.token_cache_path();
        if cache.exists() {
            results.push(CheckResult::ok("Token cache", &format!("{}", cache.display())));
        } else {
            results.push(CheckResult::warning(
                "Token cache",
                &format!("{} (not created yet)", cache.display()),
                "The first calendar run will ask you to sign in",
            ));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_masking() {
        let result = check_openai_api_key(Some("sk-proj-abcdefghijklmnop1234".to_string()));
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (sk-proj...1234)");

        // Multi-byte characters straddling the cut points
        let result = check_openai_api_key(Some("sk-éééééééééééééééééé€€€€".to_string()));
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "configured (sk-éééé...€€€€)");
    }

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_api_key_checks() {
        assert_eq!(
            check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz".to_string())).status,
            CheckStatus::Ok
        );
        assert_eq!(
            check_openai_api_key(Some("local-proxy".to_string())).status,
            CheckStatus::Warning
        );
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Error);
    }

    #[test]
    fn test_source_checks() {
        let mut settings = Settings::default();
        let results = check_sources(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(results[1].status, CheckStatus::Error);
        assert_eq!(results[2].status, CheckStatus::Warning);

        settings.calendar.disabled = true;
        settings.weather.api_key = Some("key".to_string());
        let results = check_sources(&settings);
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert_eq!(results[1].status, CheckStatus::Ok);
    }

    #[test]
    fn test_secret_without_user() {
        let mut settings = Settings::default();
        settings.calendar.client_id = Some("client".to_string());
        settings.calendar.tenant_id = Some("tenant".to_string());
        settings.calendar.client_secret = Some("secret".to_string());
        assert_eq!(check_sources(&settings)[0].status, CheckStatus::Error);

        settings.calendar.user = Some("ceo@example.com".to_string());
        assert_eq!(check_sources(&settings)[0].status, CheckStatus::Ok);
    }

    #[test]
    fn test_schedule_check() {
        let mut settings = Settings::default();
        assert_eq!(check_schedule(&settings).status, CheckStatus::Ok);
        settings.schedule.time = "half six".to_string();
        assert_eq!(check_schedule(&settings).status, CheckStatus::Error);
    }
}
