use chrono::{DateTime, Utc};
use membergate_common::helpers::codes::generate_code;
use membergate_common::helpers::hash::hash_password;
use membergate_common::{AccountsConfig, LoginMode, MembergateError, Secret};
use membergate_db_entities::Account;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use tracing::*;
use url::Url;

use crate::accounts::find_account_by_email;
use crate::mail::{templates, Mailer};
use crate::registration::MIN_PASSWORD_LENGTH;
use crate::reminder::{evaluate_pending_account, PendingOutcome};
use crate::verification::{
    code_link, find_account_by_code, recovery_code_transition, recovery_transition, CodeKind,
};

/// What actually happened behind the neutral "if the address was found, a
/// mail was sent" answer.
pub enum ForgotOutcome {
    RecoveryMailSent,
    ReminderSent,
    NothingFound,
}

/// Forgot-login-data request. The recovery link is mailed first; the code is
/// persisted only when the mail went out, so nobody ends up holding a code
/// whose link never arrived.
pub async fn request_recovery(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    external_url: &Url,
    email: &str,
    now: DateTime<Utc>,
) -> Result<ForgotOutcome, MembergateError> {
    let Some(account) = find_account_by_email(db, email).await? else {
        debug!(%email, "Recovery requested for unknown address");
        return Ok(ForgotOutcome::NothingFound);
    };

    if account.is_pending() {
        return match evaluate_pending_account(db, config, mailer, external_url, account, now)
            .await?
        {
            PendingOutcome::Deleted => Ok(ForgotOutcome::NothingFound),
            PendingOutcome::Kept { reminder_sent, .. } => {
                if reminder_sent {
                    Ok(ForgotOutcome::ReminderSent)
                } else {
                    Ok(ForgotOutcome::NothingFound)
                }
            }
        };
    }

    let code = generate_code();
    let link = code_link(external_url, CodeKind::RecoveryLoginData, &code)?;
    let mail = templates::recovery_mail(&account.language, &account.username, &link);
    mailer.send(&account.email, mail).await?;

    recovery_code_transition(account, code, now).update(db).await?;
    Ok(ForgotOutcome::RecoveryMailSent)
}

/// Consume a recovery code: set the new password and, in username login
/// mode, optionally a new username.
pub async fn complete_recovery(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    code: &str,
    new_password: &Secret<String>,
    new_username: Option<String>,
) -> Result<Account::Model, MembergateError> {
    let account = find_account_by_code(db, CodeKind::RecoveryLoginData, code).await?;

    if new_password.expose_secret().len() < MIN_PASSWORD_LENGTH {
        return Err(MembergateError::Validation(format!(
            "the password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    let new_username = match (config.login_mode, new_username) {
        (LoginMode::Username, Some(username)) if !username.is_empty() => Some(username),
        _ => None,
    };

    let account = recovery_transition(
        account,
        hash_password(new_password.expose_secret()),
        new_username,
    )
    .update(db)
    .await?;
    info!(username=%account.username, "Login data recovered");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        insert_account, insert_pending_account, test_config, test_db, RecordingMailer,
    };

    fn url() -> Url {
        #[allow(clippy::unwrap_used)]
        Url::parse("https://members.example.org/").unwrap()
    }

    #[tokio::test]
    async fn recovery_mails_first_and_persists_on_success() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        let account = insert_account(&db, "alice", "alice@example.org", false).await;

        let outcome = request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ForgotOutcome::RecoveryMailSent));

        let stored = crate::accounts::find_account_by_id(&db, account.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.recovery_code.is_empty());
        assert!(stored.recovery_datetime.is_some());

        let sent = mailer.sent().await;
        assert!(sent[0].1.body.contains(&stored.recovery_code));
    }

    #[tokio::test]
    async fn mail_failure_leaves_no_code_behind() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::failing();
        let account = insert_account(&db, "alice", "alice@example.org", false).await;

        let result = request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(MembergateError::MailSend(_))));

        let stored = crate::accounts::find_account_by_id(&db, account.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.recovery_code.is_empty());
        assert!(stored.recovery_datetime.is_none());
    }

    #[tokio::test]
    async fn unknown_address_is_silently_ignored() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let outcome = request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "nobody@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ForgotOutcome::NothingFound));
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn pending_account_gets_the_reminder_treatment() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        let created = Utc::now() - chrono::Duration::days(6);
        insert_pending_account(&db, "alice", "alice@example.org", created).await;

        let outcome = request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ForgotOutcome::ReminderSent));

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.body.contains("activationcode="));
    }

    #[tokio::test]
    async fn completion_resets_the_password_and_clears_the_pair() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        insert_account(&db, "alice", "alice@example.org", false).await;

        request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        let stored = crate::accounts::find_account_by_email(&db, "alice@example.org")
            .await
            .unwrap()
            .unwrap();
        let code = stored.recovery_code.clone();

        let account = complete_recovery(
            &db,
            &config,
            &code,
            &Secret::new("a brand new password".to_owned()),
            None,
        )
        .await
        .unwrap();
        assert!(account.recovery_code.is_empty());
        assert!(account.recovery_datetime.is_none());
        assert!(membergate_common::helpers::hash::verify_password_hash(
            "a brand new password",
            &account.password_hash
        )
        .unwrap());

        // single use
        let result = complete_recovery(
            &db,
            &config,
            &code,
            &Secret::new("a brand new password".to_owned()),
            None,
        )
        .await;
        assert!(matches!(result, Err(MembergateError::CodeNotFound)));
    }

    #[tokio::test]
    async fn username_change_is_only_honored_in_username_mode() {
        let db = test_db().await;
        let mut config = test_config();
        let mailer = RecordingMailer::default();
        insert_account(&db, "alice", "alice@example.org", false).await;

        request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        let stored = crate::accounts::find_account_by_email(&db, "alice@example.org")
            .await
            .unwrap()
            .unwrap();

        // email mode ignores the requested rename
        let account = complete_recovery(
            &db,
            &config,
            &stored.recovery_code.clone(),
            &Secret::new("a brand new password".to_owned()),
            Some("allison".to_owned()),
        )
        .await
        .unwrap();
        assert_eq!(account.username, "alice");

        config.login_mode = LoginMode::Username;
        request_recovery(
            &db,
            &config,
            &mailer,
            &url(),
            "alice@example.org",
            Utc::now(),
        )
        .await
        .unwrap();
        let stored = crate::accounts::find_account_by_email(&db, "alice@example.org")
            .await
            .unwrap()
            .unwrap();

        let account = complete_recovery(
            &db,
            &config,
            &stored.recovery_code.clone(),
            &Secret::new("a brand new password".to_owned()),
            Some("allison".to_owned()),
        )
        .await
        .unwrap();
        assert_eq!(account.username, "allison");
    }
}
