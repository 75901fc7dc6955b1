//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

const MASK: &str = "********";

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&masked(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Replace credentials with a fixed mask.
fn masked(mut settings: Settings) -> Settings {
    for secret in [
        &mut settings.calendar.client_secret,
        &mut settings.weather.api_key,
        &mut settings.market.api_key,
        &mut settings.email.smtp_password,
    ] {
        if secret.is_some() {
            *secret = Some(MASK.to_string());
        }
    }
    settings
}
