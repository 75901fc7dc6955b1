//! SMTP delivery using Lettre.

use crate::config::EmailSettings;
use crate::error::{BriefError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Implicit-TLS submission port.
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Parse a configured port, falling back to 465 when unset or invalid.
pub fn parse_port(value: Option<&str>) -> u16 {
    value
        .and_then(|v| v.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_SMTP_PORT)
}

/// Sends plain-text mail through an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from settings. The SMTP user is also the sender.
    pub fn from_settings(settings: &EmailSettings) -> Result<Self> {
        let host = required(&settings.smtp_host, "SMTP_HOST")?;
        let user = required(&settings.smtp_user, "SMTP_USER")?;
        let password = required(&settings.smtp_password, "SMTP_PASS")?;
        let recipient = required(&settings.recipient, "RECIPIENT")?;

        let from = user
            .parse::<Mailbox>()
            .map_err(|e| BriefError::Config(format!("Invalid SMTP_USER address: {e}")))?;
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| BriefError::Config(format!("Invalid RECIPIENT address: {e}")))?;

        Ok(Self {
            host: host.to_string(),
            port: parse_port(settings.smtp_port.as_deref()),
            credentials: Credentials::new(user.to_string(), password.to_string()),
            from,
            to,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Build the plain-text message.
    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| BriefError::Email(format!("Failed to build email: {e}")))
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| BriefError::Email(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    /// Send one message to the configured recipient.
    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        let transport = self.build_transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| BriefError::Email(format!("Failed to send email: {e}")))?;

        info!("Briefing emailed to {}", self.to);
        Ok(())
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BriefError::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EmailSettings {
        EmailSettings {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: None,
            smtp_user: Some("briefing@example.com".to_string()),
            smtp_password: Some("secret".to_string()),
            recipient: Some("ceo@example.com".to_string()),
        }
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None), 465);
        assert_eq!(parse_port(Some("587")), 587);
        assert_eq!(parse_port(Some(" 2525 ")), 2525);
        assert_eq!(parse_port(Some("smtp")), 465);
        assert_eq!(parse_port(Some("70000")), 465);
        assert_eq!(parse_port(Some("0")), 465);
        assert_eq!(parse_port(Some("")), 465);
    }

    #[test]
    fn test_from_settings_defaults_port() {
        let mailer = SmtpMailer::from_settings(&settings()).unwrap();
        assert_eq!(mailer.port(), 465);

        let mut custom = settings();
        custom.smtp_port = Some("587".to_string());
        assert_eq!(SmtpMailer::from_settings(&custom).unwrap().port(), 587);
    }

    #[test]
    fn test_missing_settings_are_config_errors() {
        let cases: [fn(&mut EmailSettings); 4] = [
            |s| s.smtp_host = None,
            |s| s.smtp_user = None,
            |s| s.smtp_password = Some("  ".to_string()),
            |s| s.recipient = None,
        ];

        for clear in cases {
            let mut s = settings();
            clear(&mut s);
            assert!(matches!(
                SmtpMailer::from_settings(&s),
                Err(BriefError::Config(_))
            ));
        }
    }

    #[test]
    fn test_invalid_recipient() {
        let mut s = settings();
        s.recipient = Some("not an address".to_string());
        let err = SmtpMailer::from_settings(&s).err().unwrap();
        assert!(err.to_string().contains("RECIPIENT"));
    }

    #[test]
    fn test_build_message_headers() {
        let mailer = SmtpMailer::from_settings(&settings()).unwrap();
        let message = mailer
            .build_message("Executive Daily Briefing - 2024-05-01", "Headlines:\n")
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: briefing@example.com"));
        assert!(raw.contains("To: ceo@example.com"));
        assert!(raw.contains("Subject: Executive Daily Briefing - 2024-05-01"));
        assert!(raw.contains("Content-Type: text/plain"));
    }
}
