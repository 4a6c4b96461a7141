use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use membergate_common::helpers::codes::generate_two_factor_code;
use membergate_common::{MembergateError, Secret};
use membergate_db_entities::Account;
use tokio::sync::Mutex;
use tracing::*;
use uuid::Uuid;

use super::{TwoFactorState, TwoFactorStore};
use crate::mail::{templates, Mailer};

/// What the web layer stashes in the HTTP session while the secondary check
/// is pending.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub state_id: Uuid,
    pub session_key: Secret<String>,
}

#[async_trait]
pub trait TwoFactorProvider: Send + Sync {
    /// Issue a code for the account and park a pending state.
    async fn start(&self, account: &Account::Model) -> Result<SessionInfo, MembergateError>;

    /// Deliver a code to the account's owner; false means delivery failed.
    async fn send_code(&self, account: &Account::Model, code: &str) -> bool;
}

/// The email-backed provider the service injects by default.
pub struct EmailTwoFactor {
    store: Arc<Mutex<TwoFactorStore>>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
}

impl EmailTwoFactor {
    pub fn new(
        store: Arc<Mutex<TwoFactorStore>>,
        mailer: Arc<dyn Mailer>,
        code_ttl: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            code_ttl,
        }
    }
}

#[async_trait]
impl TwoFactorProvider for EmailTwoFactor {
    async fn start(&self, account: &Account::Model) -> Result<SessionInfo, MembergateError> {
        let code = generate_two_factor_code();
        if !self.send_code(account, &code).await {
            return Err(MembergateError::MailSend(
                "could not deliver the login code".to_owned(),
            ));
        }

        let state = TwoFactorState::new(account.id, code);
        let info = SessionInfo {
            state_id: state.id,
            session_key: state.session_key.clone(),
        };
        self.store.lock().await.insert(state);
        Ok(info)
    }

    async fn send_code(&self, account: &Account::Model, code: &str) -> bool {
        let mail = templates::two_factor_mail(
            &account.language,
            &account.username,
            code,
            self.code_ttl.as_secs(),
        );
        match self.mailer.send(&account.email, mail).await {
            Ok(()) => true,
            Err(error) => {
                error!(username=%account.username, %error, "Failed to send two-factor code");
                false
            }
        }
    }
}
