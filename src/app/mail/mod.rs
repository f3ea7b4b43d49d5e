//! Transactional email. The sender is chosen per environment; delivery is
//! best-effort and never fails the request that triggered it.

use std::sync::Arc;

use crate::app::{config::Config, domain::Email};

/// Message to be sent via any email implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: Email, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Abstract interface for sending email. Swappable per environment.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Errors that can occur during email sending.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Send error: {0}")]
    Send(String),
}

pub use console::{ConsoleMailer, RecordingMailer};
pub use smtp::SmtpMailer;

mod console;
mod smtp;
pub mod templates;

/// Build the email sender from config.
pub fn from_config(config: &Config) -> Result<Arc<dyn EmailSender>, EmailError> {
    match config.mail_adapter.as_str() {
        "console" => Ok(Arc::new(ConsoleMailer::new(config.mail_from.clone()))),
        "smtp" => Ok(Arc::new(SmtpMailer::from_config(config)?)),
        other => Err(EmailError::Config(format!("Unknown MAIL_ADAPTER: {other}"))),
    }
}

/// Send `message`, logging instead of propagating failures. The database write
/// that triggered the email has already happened and stays authoritative.
pub async fn deliver(sender: &dyn EmailSender, message: EmailMessage) {
    if let Err(err) = sender.send(&message).await {
        tracing::warn!(%err, to = %message.to, subject = %message.subject, "email delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_adapter_is_rejected() {
        let mut config = Config::for_tests();
        config.mail_adapter = "pigeon".to_string();
        assert!(matches!(from_config(&config), Err(EmailError::Config(_))));
    }

    #[test]
    fn smtp_adapter_requires_host() {
        let mut config = Config::for_tests();
        config.mail_adapter = "smtp".to_string();
        assert!(matches!(from_config(&config), Err(EmailError::Config(_))));
    }

    #[tokio::test]
    async fn deliver_swallows_errors() {
        struct Failing;

        #[async_trait::async_trait]
        impl EmailSender for Failing {
            async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
                Err(EmailError::Send("offline".to_string()))
            }
        }

        let to = Email::new("ops@example.com").unwrap();
        deliver(&Failing, EmailMessage::new(to, "s", "b")).await;
    }
}
