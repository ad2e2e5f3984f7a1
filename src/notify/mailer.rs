//! Absence-notification email delivery over SMTP.
//!
//! [`SmtpConfig::from_env`] returns `None` when `SMTP_HOST` is not set,
//! signalling that delivery is not configured; the dispatcher is then not
//! spawned and queued notifications stay pending.

use chrono::NaiveDate;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender identity when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Attendance System <attendance@sams.local>";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Load SMTP settings from the environment; `None` if `SMTP_HOST` is unset.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            username: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

pub fn absence_subject(first_name: &str, last_name: &str) -> String {
    format!("Attendance Notification - {} {}", first_name, last_name)
}

pub fn absence_body(first_name: &str, last_name: &str, date: &str) -> String {
    format!(
        "<h1>Attendance Notification</h1>\
         <p>This is to inform you that {} {} was marked as absent on {}.</p>\
         <p>Please contact the school administration for any questions.</p>",
        first_name, last_name, date
    )
}

/// Sends absence-notification emails with a fixed sender identity.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| MailError::Build(format!("invalid SMTP_FROM: {e}")))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Send the fixed absence notice for one student/date to `to_email`.
    pub async fn send_absence_notice(
        &self,
        to_email: &str,
        first_name: &str,
        last_name: &str,
        date: NaiveDate,
    ) -> Result<(), MailError> {
        let date = date.format("%Y-%m-%d").to_string();

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_email.parse()?)
            .subject(absence_subject(first_name, last_name))
            .header(ContentType::TEXT_HTML)
            .body(absence_body(first_name, last_name, &date))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(email).await?;

        tracing::info!(to = to_email, date = %date, "Absence notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_names_the_student() {
        assert_eq!(
            absence_subject("A", "B"),
            "Attendance Notification - A B"
        );
    }

    #[test]
    fn body_names_student_and_date() {
        let body = absence_body("A", "B", "2024-03-01");
        assert!(body.contains("A B was marked as absent on 2024-03-01"));
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        unsafe { std::env::remove_var("SMTP_HOST") };
        assert!(SmtpConfig::from_env().is_none());
    }

    #[test]
    fn mail_error_display_build() {
        let err = MailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
