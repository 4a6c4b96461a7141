use chrono::{DateTime, Utc};
use membergate_common::helpers::codes::generate_code;
use membergate_common::helpers::hash::hash_password;
use membergate_common::{AccountsConfig, LoginMode, MembergateError, Secret};
use membergate_db_entities::Account;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::*;
use url::Url;
use uuid::Uuid;

use crate::mail::{templates, Mailer};
use crate::reminder::{evaluate_pending_account, send_reminder, PendingOutcome};
use crate::verification::{activation_transition, code_link, find_account_by_code, CodeKind};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    pub language: Option<String>,
}

pub enum RegistrationOutcome {
    Created {
        account: Account::Model,
        mail_sent: bool,
    },
    /// The email already belongs to a pending account; the reminder went
    /// out again instead of a duplicate being created.
    PendingDuplicate { reminder_sent: bool },
}

fn validate_registration(
    config: &AccountsConfig,
    request: &RegistrationRequest,
) -> Result<(), MembergateError> {
    if !request.email.contains('@') {
        return Err(MembergateError::Validation(
            "a valid email address is required".to_owned(),
        ));
    }
    if config.login_mode == LoginMode::Username && request.username.is_empty() {
        return Err(MembergateError::Validation(
            "a username is required".to_owned(),
        ));
    }
    if request.password.expose_secret().len() < MIN_PASSWORD_LENGTH {
        return Err(MembergateError::Validation(format!(
            "the password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Create a pending account and mail the activation link. The account is
/// persisted first; a mail failure is reported but leaves it created.
pub async fn register_account(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    external_url: &Url,
    request: RegistrationRequest,
    now: DateTime<Utc>,
) -> Result<RegistrationOutcome, MembergateError> {
    validate_registration(config, &request)?;

    if let Some(existing) = Account::Entity::find()
        .filter(ColumnTrait::eq(&Account::Column::Email, &request.email))
        .one(db)
        .await?
    {
        if existing.is_pending() {
            match evaluate_pending_account(db, config, mailer, external_url, existing, now).await? {
                // the stale duplicate is gone, the registration may proceed
                PendingOutcome::Deleted => (),
                PendingOutcome::Kept {
                    account,
                    reminder_sent,
                } => {
                    let reminder_sent = if reminder_sent {
                        true
                    } else {
                        let (_, sent) =
                            send_reminder(db, config, mailer, external_url, account, now).await?;
                        sent
                    };
                    return Ok(RegistrationOutcome::PendingDuplicate { reminder_sent });
                }
            }
        } else {
            // deliberately vague, the address must not be probeable
            return Err(MembergateError::Validation(
                "this email address cannot be used".to_owned(),
            ));
        }
    }

    if config.login_mode == LoginMode::Username {
        let taken = Account::Entity::find()
            .filter(ColumnTrait::eq(&Account::Column::Username, &request.username))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(MembergateError::Validation(
                "this username cannot be used".to_owned(),
            ));
        }
    }

    let username = if request.username.is_empty() {
        request.email.clone()
    } else {
        request.username
    };
    let activation_code = generate_code();

    let account = Account::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(request.email),
        password_hash: Set(hash_password(request.password.expose_secret())),
        activation_code: Set(activation_code.clone()),
        activation_datetime: Set(None),
        reminder_datetime: Set(None),
        recovery_code: Set(String::new()),
        recovery_datetime: Set(None),
        delete_code: Set(String::new()),
        delete_datetime: Set(None),
        unlock_code: Set(String::new()),
        created: Set(now),
        language: Set(request
            .language
            .unwrap_or_else(|| config.default_locale.clone())),
        two_factor: Set(None),
    }
    .insert(db)
    .await?;
    info!(username=%account.username, "Created pending account");

    let activation_link = code_link(external_url, CodeKind::Activation, &activation_code)?;
    let not_registered_link = code_link(external_url, CodeKind::NotRegistered, &activation_code)?;
    let mail = templates::activation_mail(
        &account.language,
        &account.username,
        &activation_link,
        &not_registered_link,
    );
    let mail_sent = match mailer.send(&account.email, mail).await {
        Ok(()) => true,
        Err(error) => {
            error!(username=%account.username, %error, "Failed to send activation mail");
            false
        }
    };

    Ok(RegistrationOutcome::Created { account, mail_sent })
}

/// Consume an activation code: the account becomes verified, and two-factor
/// is switched on for accounts without an explicit preference when the
/// service has it enabled.
pub async fn activate_account(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Account::Model, MembergateError> {
    let account = find_account_by_code(db, CodeKind::Activation, code).await?;
    let account = activation_transition(account, now, config.two_factor)
        .update(db)
        .await?;
    info!(username=%account.username, "Account activated");
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

    fn request(email: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: "alice".to_owned(),
            email: email.to_owned(),
            password: Secret::new("correct horse battery".to_owned()),
            language: None,
        }
    }

    #[tokio::test]
    async fn registration_creates_a_pending_account_and_mails_both_links() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let outcome = register_account(
            &db,
            &config,
            &mailer,
            &url(),
            request("alice@example.org"),
            Utc::now(),
        )
        .await
        .unwrap();

        let RegistrationOutcome::Created { account, mail_sent } = outcome else {
            panic!("account must be created");
        };
        assert!(mail_sent);
        assert!(account.is_pending());
        assert!(account.activation_datetime.is_none());

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .1
            .body
            .contains(&format!("activationcode={}", account.activation_code)));
        assert!(sent[0]
            .1
            .body
            .contains(&format!("notregisteredcode={}", account.activation_code)));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();

        let mut req = request("alice@example.org");
        req.password = Secret::new("short".to_owned());
        let result =
            register_account(&db, &config, &mailer, &url(), req, Utc::now()).await;
        assert!(matches!(result, Err(MembergateError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_pending_registration_resends_the_reminder() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        insert_pending_account(&db, "alice", "alice@example.org", Utc::now()).await;

        let outcome = register_account(
            &db,
            &config,
            &mailer,
            &url(),
            request("alice@example.org"),
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            RegistrationOutcome::PendingDuplicate {
                reminder_sent: true
            }
        ));
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_active_registration_is_refused_neutrally() {
        let db = test_db().await;
        let config = test_config();
        let mailer = RecordingMailer::default();
        insert_account(&db, "alice", "alice@example.org", false).await;

        let result = register_account(
            &db,
            &config,
            &mailer,
            &url(),
            request("alice@example.org"),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(MembergateError::Validation(_))));
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn activation_consumes_the_code() {
        let db = test_db().await;
        let config = test_config();
        let account = insert_pending_account(&db, "alice", "alice@example.org", Utc::now()).await;
        let code = account.activation_code.clone();

        let account = activate_account(&db, &config, &code, Utc::now())
            .await
            .unwrap();
        assert!(!account.is_pending());
        assert!(account.activation_datetime.is_some());

        // the code is single-use
        let result = activate_account(&db, &config, &code, Utc::now()).await;
        assert!(matches!(result, Err(MembergateError::CodeNotFound)));
    }

    #[tokio::test]
    async fn activation_auto_enables_two_factor_when_the_service_has_it_on() {
        let db = test_db().await;
        let mut config = test_config();
        config.two_factor = true;
        let account = insert_pending_account(&db, "alice", "alice@example.org", Utc::now()).await;

        let account = activate_account(&db, &config, &account.activation_code.clone(), Utc::now())
            .await
            .unwrap();
        assert_eq!(account.two_factor, Some(true));
    }
}
