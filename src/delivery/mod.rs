//! Fixed-template briefing email and SMTP delivery.

mod formatter;
mod mailer;

pub use formatter::{build_email_body, subject_for};
pub use mailer::{parse_port, SmtpMailer, DEFAULT_SMTP_PORT};
