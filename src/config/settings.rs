//! Configuration settings for the briefing agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub news: NewsSettings,
    pub calendar: CalendarSettings,
    pub weather: WeatherSettings,
    pub market: MarketSettings,
    pub email: EmailSettings,
    pub schedule: ScheduleSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for the per-day log files.
    pub log_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Orchestration loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Chat model used for the function-calling loop.
    pub model: String,
    /// Override for the OpenAI API base URL.
    pub api_base: Option<String>,
    /// Ceiling on model calls per run.
    pub max_turns: usize,
    /// Attempts per tool invocation before the run is aborted.
    pub max_attempts: usize,
    /// Replaces the built-in system prompt.
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            max_turns: 15,
            max_attempts: 3,
            system_prompt: None,
        }
    }
}

/// RSS news settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    /// Feeds to read, in priority order.
    pub feeds: Vec<String>,
    /// Headlines returned when the caller does not ask for a count.
    pub default_page_size: usize,
    /// Per-feed request timeout.
    pub timeout_secs: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            feeds: vec![
                "https://news.google.com/rss/headlines/section/topic/BUSINESS".to_string(),
                "https://news.google.com/rss/headlines/section/topic/TECHNOLOGY".to_string(),
            ],
            default_page_size: 7,
            timeout_secs: 10,
        }
    }
}

/// Microsoft Graph calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    /// Enables the client-credentials exchange.
    pub client_secret: Option<String>,
    /// Mailbox to read when running with application credentials.
    pub user: Option<String>,
    /// Path of the persisted token cache.
    pub token_cache: String,
    /// Skip the calendar entirely and report no meetings.
    pub disabled: bool,
    pub authority: String,
    pub graph_base: String,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            tenant_id: None,
            client_secret: None,
            user: None,
            token_cache: ".azure_token_cache.json".to_string(),
            disabled: false,
            authority: "https://login.microsoftonline.com".to_string(),
            graph_base: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

/// WeatherAPI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    /// City name or "lat,lon".
    pub location: String,
    pub base_url: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            location: "Melbourne".to_string(),
            base_url: "http://api.weatherapi.com/v1".to_string(),
        }
    }
}

/// Market data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    /// Financial Modeling Prep key. Without it the keyless providers are used.
    pub api_key: Option<String>,
    pub fmp_base: String,
    pub fx_base: String,
    pub quote_base: String,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            fmp_base: "https://financialmodelingprep.com".to_string(),
            fx_base: "https://api.exchangerate.host".to_string(),
            quote_base: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct EmailSettings {
    pub smtp_host: Option<String>,
    /// Raw port value; unset or unparseable falls back to 465.
    pub smtp_port: Option<String>,
    pub smtp_user: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub recipient: Option<String>,
}

/// Daily scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Local wall-clock time, HH:MM.
    pub time: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            time: "06:30".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None,
    /// then apply environment overrides.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override file values with environment variables.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LOG_DIR") {
            self.general.log_dir = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.agent.model = v;
        }
        if let Some(v) = get("AZURE_CLIENT_ID") {
            self.calendar.client_id = Some(v);
        }
        if let Some(v) = get("AZURE_TENANT_ID") {
            self.calendar.tenant_id = Some(v);
        }
        if let Some(v) = get("AZURE_CLIENT_SECRET") {
            self.calendar.client_secret = Some(v);
        }
        if let Some(v) = get("AZURE_TOKEN_CACHE") {
            self.calendar.token_cache = v;
        }
        if get("CI").is_some() || get("BRIEF_SKIP_CALENDAR").is_some() {
            self.calendar.disabled = true;
        }
        if let Some(v) = get("WEATHER_API_KEY") {
            self.weather.api_key = Some(v);
        }
        if let Some(v) = get("LOCATION") {
            self.weather.location = v;
        }
        if let Some(v) = get("FMP_API_KEY") {
            self.market.api_key = Some(v);
        }
        if let Some(v) = get("SMTP_HOST") {
            self.email.smtp_host = Some(v);
        }
        if let Some(v) = get("SMTP_PORT") {
            self.email.smtp_port = Some(v);
        }
        if let Some(v) = get("SMTP_USER") {
            self.email.smtp_user = Some(v);
        }
        if let Some(v) = get("SMTP_PASS") {
            self.email.smtp_password = Some(v);
        }
        if let Some(v) = get("RECIPIENT") {
            self.email.recipient = Some(v);
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("brief-agent")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded log directory path.
    pub fn log_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.log_dir)
    }

    /// Get the expanded token cache path.
    pub fn token_cache_path(&self) -> PathBuf {
        Self::expand_path(&self.calendar.token_cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.agent.max_attempts, 3);
        assert_eq!(settings.news.default_page_size, 7);
        assert_eq!(settings.news.feeds.len(), 2);
        assert_eq!(settings.weather.location, "Melbourne");
        assert_eq!(settings.schedule.time, "06:30");
        assert!(!settings.calendar.disabled);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("WEATHER_API_KEY", "wk"),
            ("LOCATION", "Sydney"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_TENANT_ID", "tenant"),
            ("SMTP_PORT", "587"),
            ("LOG_DIR", "/var/log/brief"),
        ]));

        assert_eq!(settings.weather.api_key.as_deref(), Some("wk"));
        assert_eq!(settings.weather.location, "Sydney");
        assert_eq!(settings.calendar.client_id.as_deref(), Some("client"));
        assert_eq!(settings.calendar.tenant_id.as_deref(), Some("tenant"));
        assert_eq!(settings.email.smtp_port.as_deref(), Some("587"));
        assert_eq!(settings.general.log_dir, "/var/log/brief");
        assert!(settings.market.api_key.is_none());
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[("WEATHER_API_KEY", "  "), ("CI", "")]));
        assert!(settings.weather.api_key.is_none());
        assert!(!settings.calendar.disabled);
    }

    #[test]
    fn test_ci_flag_disables_calendar() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[("CI", "true")]));
        assert!(settings.calendar.disabled);

        let mut settings = Settings::default();
        settings.apply_env(env(&[("BRIEF_SKIP_CALENDAR", "1")]));
        assert!(settings.calendar.disabled);
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [weather]
            location = "Perth"

            [agent]
            max_turns = 4
            "#,
        )
        .unwrap();
        assert_eq!(settings.weather.location, "Perth");
        assert_eq!(settings.agent.max_turns, 4);
        assert_eq!(settings.agent.max_attempts, 3);
        assert_eq!(settings.general.log_dir, "logs");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\ntime = \"07:15\"\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.schedule.time, "07:15");

        let missing = dir.path().join("absent.toml");
        let defaults = Settings::load_from(Some(&missing)).unwrap();
        assert_eq!(defaults.schedule.time, Settings::default().schedule.time);
    }
}
