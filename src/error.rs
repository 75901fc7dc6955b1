//! Error types for the briefing agent.

use thiserror::Error;

/// Library-level error type for briefing operations.
#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid ISO date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl BriefError {
    /// Whether another attempt at the same call could succeed.
    ///
    /// Configuration and validation failures are deterministic, so retrying
    /// them only repeats the failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BriefError::Config(_)
                | BriefError::InvalidDate(_)
                | BriefError::InvalidToolArguments { .. }
        )
    }
}

/// Result type alias for briefing operations.
pub type Result<T> = std::result::Result<T, BriefError>;
