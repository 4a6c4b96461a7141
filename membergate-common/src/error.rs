use std::error::Error;

use poem::error::ResponseError;
use poem::http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum MembergateError {
    /// Deliberately covers never-existed, expired and already-consumed codes
    /// alike so that responses cannot be used to enumerate accounts.
    #[error("no account matches this code")]
    CodeNotFound,
    #[error("this link has expired, please request a new one")]
    LinkExpired,
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("could not send mail: {0}")]
    MailSend(String),
    #[error("invalid two-factor session key")]
    SessionInvalid,
    #[error("the two-factor code has expired")]
    SessionExpired,
    #[error("{0}")]
    Validation(String),
    #[error("account {0} not found")]
    AccountNotFound(String),
    #[error("failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("no valid Host header found and `external_host` config option is not set")]
    ExternalHostUnknown,
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl ResponseError for MembergateError {
    fn status(&self) -> StatusCode {
        match self {
            Self::CodeNotFound => StatusCode::NOT_FOUND,
            Self::LinkExpired => StatusCode::GONE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MailSend(_) => StatusCode::BAD_GATEWAY,
            Self::SessionInvalid => StatusCode::UNAUTHORIZED,
            Self::SessionExpired => StatusCode::GONE,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AccountNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl MembergateError {
    pub fn other<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }
}
