//! Persistence for OAuth tokens.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Longest lifetime accepted from a token endpoint.
const MAX_LIFETIME_SECS: i64 = 90 * 24 * 60 * 60;

/// An access token with the material needed to renew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Build a token that expires `expires_in` seconds from `now`.
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let lifetime = Duration::seconds(expires_in.clamp(-MAX_LIFETIME_SECS, MAX_LIFETIME_SECS));
        Self {
            access_token,
            refresh_token,
            expires_at: now.checked_add_signed(lifetime).unwrap_or(now),
        }
    }

    /// Whether the access token can still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now
    }
}

/// Storage for the calendar's OAuth tokens.
pub trait TokenStore: Send + Sync {
    /// Load the stored token, if any.
    fn load(&self) -> Result<Option<CachedToken>>;

    /// Replace the stored token.
    fn save(&self, token: &CachedToken) -> Result<()>;
}

/// Token cache kept as a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<CachedToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable token cache {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, token: &CachedToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string(token)?)?;
        Ok(())
    }
}

/// Token cache held in memory.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<CachedToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CachedToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<CachedToken>> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &CachedToken) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }
}
