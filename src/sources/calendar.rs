//! Microsoft Graph calendar source.
//!
//! Token acquisition tries, in order: the cached access token, a silent
//! refresh with the cached refresh token, the client-credentials grant (when
//! a client secret is configured), and finally the interactive device-code
//! flow. Any newly issued token is written back to the [`TokenStore`].

use super::token_store::{CachedToken, TokenStore};
use super::{ensure_success, validate_iso_date, CalendarSource};
use crate::config::CalendarSettings;
use crate::error::{BriefError, Result};
use crate::models::Meeting;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DELEGATED_SCOPES: &str = "https://graph.microsoft.com/Calendars.Read offline_access";
const APPLICATION_SCOPE: &str = "https://graph.microsoft.com/.default";
const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Upper bound on how long a device-code sign-in is awaited.
const MAX_DEVICE_FLOW_SECS: u64 = 60 * 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    message: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct EventPage {
    #[serde(default)]
    value: Vec<GraphEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphEvent {
    subject: Option<String>,
    start: GraphDateTime,
    end: GraphDateTime,
}

#[derive(Debug, Deserialize)]
struct GraphDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
}

/// Outcome of a single token endpoint request.
enum TokenReply {
    Issued(CachedToken),
    Rejected(OAuthErrorResponse),
}

/// Calendar events read from Microsoft Graph.
pub struct GraphCalendar {
    http: reqwest::Client,
    client_id: Option<String>,
    tenant_id: Option<String>,
    client_secret: Option<String>,
    user: Option<String>,
    authority: String,
    graph_base: String,
    disabled: bool,
    store: Arc<dyn TokenStore>,
}

impl GraphCalendar {
    pub fn new(
        http: reqwest::Client,
        settings: &CalendarSettings,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            client_id: settings.client_id.clone(),
            tenant_id: settings.tenant_id.clone(),
            client_secret: settings.client_secret.clone(),
            user: settings.user.clone(),
            authority: settings.authority.trim_end_matches('/').to_string(),
            graph_base: settings.graph_base.trim_end_matches('/').to_string(),
            disabled: settings.disabled,
            store,
        }
    }

    fn app_identity(&self) -> Result<(&str, &str)> {
        match (self.client_id.as_deref(), self.tenant_id.as_deref()) {
            (Some(client), Some(tenant)) => Ok((client, tenant)),
            _ => Err(BriefError::Config(
                "AZURE_CLIENT_ID and AZURE_TENANT_ID must be set".to_string(),
            )),
        }
    }

    fn events_url(&self) -> Result<String> {
        match (&self.user, &self.client_secret) {
            (Some(user), _) => Ok(format!("{}/users/{}/calendarView", self.graph_base, user)),
            (None, Some(_)) => Err(BriefError::Config(
                "calendar.user must be set when AZURE_CLIENT_SECRET is used".to_string(),
            )),
            (None, None) => Ok(format!("{}/me/calendarView", self.graph_base)),
        }
    }

    /// Get a usable access token, acquiring a new one if needed.
    async fn access_token(&self) -> Result<String> {
        let (client_id, tenant_id) = self.app_identity()?;

        if let Some(cached) = self.store.load()? {
            if cached.is_valid_at(Utc::now()) {
                debug!("Using cached access token");
                return Ok(cached.access_token);
            }
            if let Some(refresh_token) = cached.refresh_token.as_deref() {
                match self.refresh(client_id, tenant_id, refresh_token).await {
                    Ok(token) => {
                        info!("Refreshed access token silently");
                        self.store.save(&token)?;
                        return Ok(token.access_token);
                    }
                    Err(e) => warn!("Silent token refresh failed: {}", e),
                }
            }
        }

        let token = match self.client_secret.as_deref() {
            Some(secret) => self.client_credentials(client_id, tenant_id, secret).await?,
            None => self.device_code(client_id, tenant_id).await?,
        };
        self.store.save(&token)?;
        Ok(token.access_token)
    }

    fn token_url(&self, tenant_id: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, tenant_id)
    }

    async fn post_token(&self, tenant_id: &str, form: &[(&str, &str)]) -> Result<TokenReply> {
        let resp = self
            .http
            .post(self.token_url(tenant_id))
            .form(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&body)?;
            return Ok(TokenReply::Issued(CachedToken::new(
                token.access_token,
                token.refresh_token,
                token.expires_in,
                Utc::now(),
            )));
        }

        serde_json::from_str(&body)
            .map(TokenReply::Rejected)
            .map_err(|_| BriefError::Auth(format!("token endpoint returned {}: {}", status, body)))
    }

    fn issued(reply: TokenReply) -> Result<CachedToken> {
        match reply {
            TokenReply::Issued(token) => Ok(token),
            TokenReply::Rejected(e) => Err(BriefError::Auth(
                e.error_description.unwrap_or(e.error),
            )),
        }
    }

    async fn refresh(
        &self,
        client_id: &str,
        tenant_id: &str,
        refresh_token: &str,
    ) -> Result<CachedToken> {
        let reply = self
            .post_token(
                tenant_id,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id),
                    ("refresh_token", refresh_token),
                    ("scope", DELEGATED_SCOPES),
                ],
            )
            .await?;
        let mut token = Self::issued(reply)?;
        // Some responses omit the refresh token; keep using the old one.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn client_credentials(
        &self,
        client_id: &str,
        tenant_id: &str,
        client_secret: &str,
    ) -> Result<CachedToken> {
        debug!("Requesting token with client credentials");
        let reply = self
            .post_token(
                tenant_id,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                    ("scope", APPLICATION_SCOPE),
                ],
            )
            .await?;
        Self::issued(reply)
    }

    async fn device_code(&self, client_id: &str, tenant_id: &str) -> Result<CachedToken> {
        let resp = self
            .http
            .post(format!("{}/{}/oauth2/v2.0/devicecode", self.authority, tenant_id))
            .form(&[("client_id", client_id), ("scope", DELEGATED_SCOPES)])
            .send()
            .await?;
        let flow: DeviceCodeResponse = ensure_success(resp, "device code endpoint")
            .await?
            .json()
            .await
            .map_err(|e| BriefError::Auth(format!("Failed to initiate device flow: {}", e)))?;

        info!("Waiting for device code sign-in");
        println!("{}", flow.message);

        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(flow.expires_in.min(MAX_DEVICE_FLOW_SECS));
        let mut interval = flow.interval.min(MAX_DEVICE_FLOW_SECS);

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(BriefError::Auth("device code expired before sign-in".to_string()));
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;

            let reply = self
                .post_token(
                    tenant_id,
                    &[
                        ("grant_type", DEVICE_CODE_GRANT),
                        ("client_id", client_id),
                        ("device_code", flow.device_code.as_str()),
                    ],
                )
                .await?;

            match reply {
                TokenReply::Issued(token) => return Ok(token),
                TokenReply::Rejected(e) if e.error == "authorization_pending" => {}
                TokenReply::Rejected(e) if e.error == "slow_down" => {
                    interval = (interval + 5).min(MAX_DEVICE_FLOW_SECS)
                }
                TokenReply::Rejected(e) => {
                    return Err(BriefError::Auth(e.error_description.unwrap_or(e.error)))
                }
            }
        }
    }
}

#[async_trait]
impl CalendarSource for GraphCalendar {
    #[instrument(skip(self))]
    async fn meetings(&self, iso_date: &str) -> Result<Vec<Meeting>> {
        validate_iso_date(iso_date)?;

        if self.disabled {
            debug!("Calendar disabled, reporting no meetings");
            return Ok(Vec::new());
        }

        let url = self.events_url()?;
        let token = self.access_token().await?;
        let start = format!("{}T00:00:00Z", iso_date);
        let end = format!("{}T23:59:59Z", iso_date);

        let mut meetings = Vec::new();
        let mut request = self.http.get(&url).query(&[
            ("startDateTime", start.as_str()),
            ("endDateTime", end.as_str()),
            ("$orderby", "start/dateTime"),
        ]);

        loop {
            let resp = request
                .bearer_auth(&token)
                .header("Prefer", "outlook.timezone=\"UTC\"")
                .send()
                .await?;
            let page: EventPage = ensure_success(resp, "Graph calendarView").await?.json().await?;

            for event in page.value {
                meetings.push(to_meeting(event)?);
            }

            match page.next_link {
                Some(next) => request = self.http.get(next),
                None => break,
            }
        }

        debug!("Fetched {} meetings", meetings.len());
        Ok(meetings)
    }
}

fn to_meeting(event: GraphEvent) -> Result<Meeting> {
    let summary = event
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "(no title)".to_string());

    Ok(Meeting {
        start: parse_graph_time(&event.start.date_time)?,
        end: parse_graph_time(&event.end.date_time)?,
        summary,
    })
}

/// Graph returns naive timestamps in the zone named by the Prefer header.
fn parse_graph_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| BriefError::Provider(format!("bad event timestamp '{}': {}", value, e)))
}
