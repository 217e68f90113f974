//! Outbound email seam.
//!
//! Delivery runs through a configured relay owned by the deployment; the
//! application only sees this trait. Failures surface as distinct
//! categories and are never retried here.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// A message handed to the relay.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Relay failure categories, surfaced verbatim to the caller.
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Relay authentication failed: {0}")]
    Auth(String),
    #[error("Could not connect to relay: {0}")]
    Connect(String),
    #[error("Relay timed out: {0}")]
    Timeout(String),
    #[error("Recipient rejected: {0}")]
    RecipientRejected(String),
    #[error("Mail delivery failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Mailer that records deliveries in the log instead of sending them.
/// Default for development and tests.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        info!("Would send email to {}: {}", email.to, email.subject);
        Ok(())
    }
}
