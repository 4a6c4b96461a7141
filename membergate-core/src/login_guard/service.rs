use std::sync::Arc;

use membergate_common::helpers::codes::generate_code;
use membergate_common::{AccountsConfig, MembergateError};
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use tracing::*;
use url::Url;
use uuid::Uuid;

use super::cache::{AttemptSnapshot, LoginAttemptCache};
use crate::accounts::find_account_by_identifier;
use crate::mail::{templates, Mailer};
use crate::verification::{code_link, lock_transition, CodeKind};

pub const FALLBACK_LOCK_THRESHOLD: u32 = 5;

/// Outcome of a lock decision, for the web layer to render.
#[derive(Clone, Debug)]
pub struct LockNotice {
    pub username: String,
    pub email: String,
    pub mail_sent: bool,
}

/// Decides lockout from failed login attempts. Attempts are session-scoped;
/// the lock itself is persisted on the account.
pub struct LoginGuard {
    cache: Arc<LoginAttemptCache>,
}

impl LoginGuard {
    pub fn new(cache: Arc<LoginAttemptCache>) -> Self {
        Self { cache }
    }

    pub fn lock_threshold(config: &AccountsConfig) -> u32 {
        if config.max_login_attempts > 0 {
            config.max_login_attempts
        } else {
            FALLBACK_LOCK_THRESHOLD
        }
    }

    /// An attack pattern is assumed only when every recorded attempt in the
    /// scope used one and the same identifier. A mix of identifiers locks
    /// nothing.
    fn should_lock(snapshot: &AttemptSnapshot, threshold: u32) -> bool {
        snapshot.distinct_identifiers == 1 && snapshot.total_attempts >= threshold as usize
    }

    /// Record a failed attempt and lock the account when the threshold is
    /// reached. The lock is persisted first; a failure to deliver the
    /// notification mail is logged, not propagated.
    pub async fn handle_failed_attempt(
        &self,
        db: &DatabaseConnection,
        config: &AccountsConfig,
        mailer: &dyn Mailer,
        external_url: &Url,
        scope_id: Uuid,
        identifier: &str,
    ) -> Result<Option<LockNotice>, MembergateError> {
        let snapshot = self.cache.record_attempt(scope_id, identifier).await;
        if !Self::should_lock(&snapshot, Self::lock_threshold(config)) {
            return Ok(None);
        }

        let Some(account) =
            find_account_by_identifier(db, config.login_mode, identifier).await?
        else {
            return Ok(None);
        };
        if account.is_locked() {
            return Ok(None);
        }

        let unlock_code = generate_code();
        let link = code_link(external_url, CodeKind::UnlockAccount, &unlock_code)?;
        let account = lock_transition(account, unlock_code).update(db).await?;
        self.cache.clear_scope(scope_id).await;
        warn!(username=%account.username, "Account locked after repeated failed logins");

        let mail = templates::account_locked_mail(&account.language, &account.username, &link);
        let mail_sent = match mailer.send(&account.email, mail).await {
            Ok(()) => true,
            Err(error) => {
                error!(username=%account.username, %error, "Failed to send lock notification");
                false
            }
        };

        Ok(Some(LockNotice {
            username: account.username,
            email: account.email,
            mail_sent,
        }))
    }

    /// Re-send the unlock link for an already locked account, e.g. when its
    /// owner tries to log in while locked.
    pub async fn resend_unlock_mail(
        &self,
        mailer: &dyn Mailer,
        external_url: &Url,
        account: &membergate_db_entities::Account::Model,
    ) -> Result<bool, MembergateError> {
        if !account.is_locked() {
            return Ok(false);
        }
        let link = code_link(external_url, CodeKind::UnlockAccount, &account.unlock_code)?;
        let mail = templates::account_locked_mail(&account.language, &account.username, &link);
        match mailer.send(&account.email, mail).await {
            Ok(()) => Ok(true),
            Err(error) => {
                error!(username=%account.username, %error, "Failed to re-send unlock mail");
                Ok(false)
            }
        }
    }

    pub async fn clear_scope(&self, scope_id: Uuid) {
        self.cache.clear_scope(scope_id).await;
    }
}
