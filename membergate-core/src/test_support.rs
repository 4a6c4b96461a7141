#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use membergate_common::helpers::codes::generate_code;
use membergate_common::helpers::hash::hash_password;
use membergate_common::AccountsConfig;
use membergate_db_entities::Account;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::mail::{Mail, MailError, Mailer};

pub const TEST_PASSWORD: &str = "correct horse battery";

pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    membergate_db_migrations::migrate_database(&db).await.unwrap();
    db
}

pub fn test_config() -> AccountsConfig {
    AccountsConfig::default()
}

pub fn pending_account() -> Account::Model {
    Account::Model {
        id: Uuid::new_v4(),
        username: "alice".to_owned(),
        email: "alice@example.org".to_owned(),
        password_hash: "$argon2id$placeholder".to_owned(),
        activation_code: generate_code(),
        activation_datetime: None,
        reminder_datetime: None,
        recovery_code: String::new(),
        recovery_datetime: None,
        delete_code: String::new(),
        delete_datetime: None,
        unlock_code: String::new(),
        created: Utc::now(),
        language: "en".to_owned(),
        two_factor: None,
    }
}

pub fn active_account() -> Account::Model {
    let mut account = pending_account();
    account.activation_code = String::new();
    account.activation_datetime = Some(Utc::now());
    account
}

pub async fn insert_account(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    two_factor: bool,
) -> Account::Model {
    Account::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(hash_password(TEST_PASSWORD)),
        activation_code: Set(String::new()),
        activation_datetime: Set(Some(Utc::now())),
        reminder_datetime: Set(None),
        recovery_code: Set(String::new()),
        recovery_datetime: Set(None),
        delete_code: Set(String::new()),
        delete_datetime: Set(None),
        unlock_code: Set(String::new()),
        created: Set(Utc::now()),
        language: Set("en".to_owned()),
        two_factor: Set(Some(two_factor)),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_pending_account(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    created: DateTime<Utc>,
) -> Account::Model {
    Account::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(hash_password(TEST_PASSWORD)),
        activation_code: Set(generate_code()),
        activation_datetime: Set(None),
        reminder_datetime: Set(None),
        recovery_code: Set(String::new()),
        recovery_datetime: Set(None),
        delete_code: Set(String::new()),
        delete_datetime: Set(None),
        unlock_code: Set(String::new()),
        created: Set(created),
        language: Set("en".to_owned()),
        two_factor: Set(None),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Test double recording every mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, Mail)>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<(String, Mail)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, mail: Mail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Address(
                "no at sign".parse::<lettre::Address>().unwrap_err(),
            ));
        }
        self.sent.lock().await.push((to.to_owned(), mail));
        Ok(())
    }
}
