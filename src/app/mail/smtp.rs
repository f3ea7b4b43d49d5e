use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};

use super::{EmailError, EmailMessage, EmailSender};
use crate::app::config::Config;

/// SMTP email sender for production use.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build from `SMTP_*` and `MAIL_FROM` settings. Credentials are optional
    /// but must be supplied together.
    pub fn from_config(config: &Config) -> Result<Self, EmailError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| EmailError::Config("SMTP_HOST is required for SMTP adapter".to_string()))?;

        let from: Mailbox = config.mail_from.parse().map_err(|e| {
            EmailError::Config(format!("Invalid MAIL_FROM '{}': {}", config.mail_from, e))
        })?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let to: Mailbox = message
            .to
            .as_str()
            .parse()
            .map_err(|e| EmailError::Config(format!("Invalid to address '{}': {}", message.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Send(format!("Failed to build email message: {e}")))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| EmailError::Smtp(format!("SMTP send failed: {e}")))
    }
}
