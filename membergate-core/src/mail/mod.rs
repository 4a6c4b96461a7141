mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use membergate_common::MembergateError;

/// A plain-text message ready for delivery. Bodies are composed by the
/// [`templates`] functions in the recipient's stored locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub subject: String,
    pub body: String,
}

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

impl From<MailError> for MembergateError {
    fn from(err: MailError) -> Self {
        MembergateError::MailSend(err.to_string())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, mail: Mail) -> Result<(), MailError>;
}
