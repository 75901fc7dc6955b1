//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are available before starting a run that
//! would otherwise fail midway, after the model has already been paid for.

use crate::config::Settings;
use crate::delivery::SmtpMailer;
use crate::error::{BriefError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The agent loop requires an OpenAI API key.
    Agent,
    /// Sending requires complete SMTP settings.
    Send,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Agent => check_api_key(std::env::var("OPENAI_API_KEY").ok()),
        Operation::Send => SmtpMailer::from_settings(&settings.email).map(|_| ()),
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key(key: Option<String>) -> Result<()> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(BriefError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(BriefError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
