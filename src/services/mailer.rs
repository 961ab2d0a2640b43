use crate::config::SmtpSettings;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while composing or delivering a notification
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to compose message: {0}")]
    Compose(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// A fully rendered email, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Outbound email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError>;
}

/// SMTP mailer
///
/// Every send opens a fresh session to the relay, upgrades it with
/// STARTTLS and authenticates with the configured username and password.
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            credentials: Credentials::new(settings.username.clone(), settings.password.clone()),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Build a multipart message with a single HTML part
    pub fn build_message(email: &OutgoingEmail) -> Result<Message, NotificationError> {
        Message::builder()
            .from(parse_mailbox(&email.from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.as_str())
            .multipart(MultiPart::mixed().singlepart(SinglePart::html(email.html_body.clone())))
            .map_err(|e| NotificationError::Compose(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        NotificationError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        let message = Self::build_message(&email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .timeout(Some(self.timeout))
            .build();

        tracing::debug!("Sending notification to {} via {}:{}", email.to, self.host, self.port);

        transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(())
    }
}
