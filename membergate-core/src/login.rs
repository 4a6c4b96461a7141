use chrono::{DateTime, Utc};
use membergate_common::helpers::hash::verify_password_hash;
use membergate_common::{AccountsConfig, MembergateError, Secret};
use membergate_db_entities::Account;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use tracing::*;
use url::Url;
use uuid::Uuid;

use crate::accounts::find_account_by_identifier;
use crate::login_guard::{LockNotice, LoginGuard};
use crate::mail::Mailer;
use crate::reminder::{evaluate_pending_account, PendingOutcome};
use crate::two_factor::{SessionInfo, TwoFactorProvider};
use crate::verification::{find_account_by_code, unlock_transition, CodeKind};

pub enum LoginOutcome {
    Success {
        account: Account::Model,
    },
    /// Credentials were right, the emailed code is still owed.
    TwoFactorRequired {
        account: Account::Model,
        session: SessionInfo,
    },
    AccountLocked {
        mail_sent: bool,
    },
    PendingActivation {
        reminder_sent: bool,
    },
    Failure {
        lock: Option<LockNotice>,
    },
}

/// Primary-credential login. Lock and pending checks come before the
/// password so that a locked or unverified owner learns their state instead
/// of a generic failure.
#[allow(clippy::too_many_arguments)]
pub async fn login(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    guard: &LoginGuard,
    two_factor: &dyn TwoFactorProvider,
    external_url: &Url,
    scope_id: Uuid,
    identifier: &str,
    password: &Secret<String>,
    now: DateTime<Utc>,
) -> Result<LoginOutcome, MembergateError> {
    let Some(account) = find_account_by_identifier(db, config.login_mode, identifier).await? else {
        let lock = guard
            .handle_failed_attempt(db, config, mailer, external_url, scope_id, identifier)
            .await?;
        return Ok(LoginOutcome::Failure { lock });
    };

    if account.is_locked() {
        let mail_sent = guard.resend_unlock_mail(mailer, external_url, &account).await?;
        return Ok(LoginOutcome::AccountLocked { mail_sent });
    }

    if account.is_pending() {
        return match evaluate_pending_account(db, config, mailer, external_url, account, now)
            .await?
        {
            PendingOutcome::Deleted => {
                let lock = guard
                    .handle_failed_attempt(db, config, mailer, external_url, scope_id, identifier)
                    .await?;
                Ok(LoginOutcome::Failure { lock })
            }
            PendingOutcome::Kept { reminder_sent, .. } => {
                Ok(LoginOutcome::PendingActivation { reminder_sent })
            }
        };
    }

    if !verify_password_hash(password.expose_secret(), &account.password_hash)? {
        debug!(%identifier, "Wrong password");
        let lock = guard
            .handle_failed_attempt(db, config, mailer, external_url, scope_id, identifier)
            .await?;
        return Ok(LoginOutcome::Failure { lock });
    }

    guard.clear_scope(scope_id).await;

    if config.two_factor && account.two_factor_enabled() {
        let session = two_factor.start(&account).await?;
        return Ok(LoginOutcome::TwoFactorRequired { account, session });
    }

    info!(username=%account.username, "Logged in");
    Ok(LoginOutcome::Success { account })
}

/// Consume an unlock code together with a correct password re-entry.
pub async fn unlock_account(
    db: &DatabaseConnection,
    code: &str,
    password: &Secret<String>,
) -> Result<Account::Model, MembergateError> {
    let account = find_account_by_code(db, CodeKind::UnlockAccount, code).await?;
    if !verify_password_hash(password.expose_secret(), &account.password_hash)? {
        return Err(MembergateError::Validation("wrong password".to_owned()));
    }
    let account = unlock_transition(account).update(db).await?;
    info!(username=%account.username, "Account unlocked");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use super::*;
    use crate::login_guard::LoginAttemptCache;
    use crate::test_support::{
        insert_account, insert_pending_account, test_config, test_db, RecordingMailer,
    };
    use crate::two_factor::{EmailTwoFactor, TwoFactorStore};

    fn url() -> Url {
        #[allow(clippy::unwrap_used)]
        Url::parse("https://members.example.org/").unwrap()
    }

    fn provider(mailer: Arc<RecordingMailer>) -> EmailTwoFactor {
        EmailTwoFactor::new(
            Arc::new(Mutex::new(TwoFactorStore::new(Duration::from_secs(180)))),
            mailer,
            Duration::from_secs(180),
        )
    }

    #[tokio::test]
    async fn correct_credentials_log_in() {
        let db = test_db().await;
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        let guard = LoginGuard::new(Arc::new(LoginAttemptCache::new()));
        insert_account(&db, "alice", "alice@example.org", false).await;

        let outcome = login(
            &db,
            &config,
            &*mailer,
            &guard,
            &provider(mailer.clone()),
            &url(),
            Uuid::new_v4(),
            "alice@example.org",
            &Secret::new("correct horse battery".to_owned()),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, LoginOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn wrong_password_is_a_failure_without_a_lock() {
        let db = test_db().await;
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        let guard = LoginGuard::new(Arc::new(LoginAttemptCache::new()));
        insert_account(&db, "alice", "alice@example.org", false).await;

        let outcome = login(
            &db,
            &config,
            &*mailer,
            &guard,
            &provider(mailer.clone()),
            &url(),
            Uuid::new_v4(),
            "alice@example.org",
            &Secret::new("not the password".to_owned()),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, LoginOutcome::Failure { lock: None }));
    }

    #[tokio::test]
    async fn two_factor_account_gets_a_code_instead_of_a_session() {
        let db = test_db().await;
        let mut config = test_config();
        config.two_factor = true;
        let mailer = Arc::new(RecordingMailer::default());
        let guard = LoginGuard::new(Arc::new(LoginAttemptCache::new()));
        insert_account(&db, "alice", "alice@example.org", true).await;

        let outcome = login(
            &db,
            &config,
            &*mailer,
            &guard,
            &provider(mailer.clone()),
            &url(),
            Uuid::new_v4(),
            "alice@example.org",
            &Secret::new("correct horse battery".to_owned()),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, LoginOutcome::TwoFactorRequired { .. }));
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn locked_account_reports_the_lock_before_checking_the_password() {
        let db = test_db().await;
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        let guard = LoginGuard::new(Arc::new(LoginAttemptCache::new()));
        let account = insert_account(&db, "alice", "alice@example.org", false).await;
        crate::verification::lock_transition(account, "unl0ckunl0ckunl0ck".to_owned())
            .update(&db)
            .await
            .unwrap();

        let outcome = login(
            &db,
            &config,
            &*mailer,
            &guard,
            &provider(mailer.clone()),
            &url(),
            Uuid::new_v4(),
            "alice@example.org",
            &Secret::new("not even checked".to_owned()),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            LoginOutcome::AccountLocked { mail_sent: true }
        ));
        let sent = mailer.sent().await;
        assert!(sent[0].1.body.contains("unl0ckunl0ckunl0ck"));
    }

    #[tokio::test]
    async fn pending_account_is_told_to_activate() {
        let db = test_db().await;
        let config = test_config();
        let mailer = Arc::new(RecordingMailer::default());
        let guard = LoginGuard::new(Arc::new(LoginAttemptCache::new()));
        insert_pending_account(&db, "alice", "alice@example.org", Utc::now()).await;

        let outcome = login(
            &db,
            &config,
            &*mailer,
            &guard,
            &provider(mailer.clone()),
            &url(),
            Uuid::new_v4(),
            "alice@example.org",
            &Secret::new("correct horse battery".to_owned()),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, LoginOutcome::PendingActivation { .. }));
    }

    #[tokio::test]
    async fn unlock_requires_the_right_password() {
        let db = test_db().await;
        let account = insert_account(&db, "alice", "alice@example.org", false).await;
        let account = crate::verification::lock_transition(account, "unl0ckunl0ckunl0ck".to_owned())
            .update(&db)
            .await
            .unwrap();
        assert!(account.is_locked());

        let result = unlock_account(
            &db,
            "unl0ckunl0ckunl0ck",
            &Secret::new("wrong".to_owned()),
        )
        .await;
        assert!(matches!(result, Err(MembergateError::Validation(_))));

        let account = unlock_account(
            &db,
            "unl0ckunl0ckunl0ck",
            &Secret::new("correct horse battery".to_owned()),
        )
        .await
        .unwrap();
        assert!(!account.is_locked());

        // the code is gone with the lock
        let result = unlock_account(
            &db,
            "unl0ckunl0ckunl0ck",
            &Secret::new("correct horse battery".to_owned()),
        )
        .await;
        assert!(matches!(result, Err(MembergateError::CodeNotFound)));
    }
}
