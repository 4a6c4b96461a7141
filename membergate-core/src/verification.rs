use std::time::Duration;

use chrono::{DateTime, Utc};
use membergate_common::MembergateError;
use membergate_db_entities::Account;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use url::Url;

/// The five code kinds of the verification protocol. Each emailed link
/// carries exactly one of these as a query parameter; the not-registered
/// link shares the stored activation code but means the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Activation,
    NotRegistered,
    RecoveryLoginData,
    DeleteAccount,
    UnlockAccount,
}

impl CodeKind {
    pub const ALL: [CodeKind; 5] = [
        CodeKind::Activation,
        CodeKind::NotRegistered,
        CodeKind::RecoveryLoginData,
        CodeKind::DeleteAccount,
        CodeKind::UnlockAccount,
    ];

    pub fn query_param(&self) -> &'static str {
        match self {
            CodeKind::Activation => "activationcode",
            CodeKind::NotRegistered => "notregisteredcode",
            CodeKind::RecoveryLoginData => "recoverylogindatacode",
            CodeKind::DeleteAccount => "deleteaccountcode",
            CodeKind::UnlockAccount => "unlockaccountcode",
        }
    }

    pub fn from_query_param(param: &str) -> Option<CodeKind> {
        CodeKind::ALL.into_iter().find(|k| k.query_param() == param)
    }

    /// Path of the endpoint that consumes this code kind.
    pub fn page_path(&self) -> &'static str {
        match self {
            CodeKind::Activation | CodeKind::NotRegistered => "activation",
            CodeKind::RecoveryLoginData => "recovery",
            CodeKind::DeleteAccount => "delete-account",
            CodeKind::UnlockAccount => "unlock",
        }
    }

    pub fn column(&self) -> Account::Column {
        match self {
            CodeKind::Activation | CodeKind::NotRegistered => Account::Column::ActivationCode,
            CodeKind::RecoveryLoginData => Account::Column::RecoveryCode,
            CodeKind::DeleteAccount => Account::Column::DeleteCode,
            CodeKind::UnlockAccount => Account::Column::UnlockCode,
        }
    }
}

/// Build the emailed link for a code: the consuming endpoint's external URL
/// with the code appended as `?<param>=<code>`.
pub fn code_link(external_url: &Url, kind: CodeKind, code: &str) -> Result<Url, MembergateError> {
    let mut url = external_url.join(kind.page_path())?;
    url.query_pairs_mut().append_pair(kind.query_param(), code);
    Ok(url)
}

/// Look up the unique account holding this code. Zero matches answer
/// [`MembergateError::CodeNotFound`] whether the code never existed, already
/// expired or was already consumed.
pub async fn find_account_by_code(
    db: &DatabaseConnection,
    kind: CodeKind,
    code: &str,
) -> Result<Account::Model, MembergateError> {
    if code.is_empty() {
        return Err(MembergateError::CodeNotFound);
    }
    Account::Entity::find()
        .filter(ColumnTrait::eq(&kind.column(), code))
        .one(db)
        .await?
        .ok_or(MembergateError::CodeNotFound)
}

/// Enforce the delete-code validity window. An expired code is cleared as a
/// side effect so that a fresh link must be requested.
pub async fn ensure_delete_code_fresh(
    db: &DatabaseConnection,
    account: Account::Model,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<Account::Model, MembergateError> {
    let Some(issued) = account.delete_datetime else {
        return Err(MembergateError::CodeNotFound);
    };
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_default();
    if now - issued > ttl {
        clear_delete_code(account).update(db).await?;
        return Err(MembergateError::LinkExpired);
    }
    Ok(account)
}

pub fn activation_transition(
    account: Account::Model,
    now: DateTime<Utc>,
    service_two_factor: bool,
) -> Account::ActiveModel {
    let auto_enable = service_two_factor && account.two_factor.is_none();
    let mut model = account.into_active_model();
    model.activation_code = Set(String::new());
    model.activation_datetime = Set(Some(now));
    if auto_enable {
        model.two_factor = Set(Some(true));
    }
    model
}

pub fn recovery_transition(
    account: Account::Model,
    new_password_hash: String,
    new_username: Option<String>,
) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.recovery_code = Set(String::new());
    model.recovery_datetime = Set(None);
    model.password_hash = Set(new_password_hash);
    if let Some(username) = new_username {
        model.username = Set(username);
    }
    model
}

pub fn unlock_transition(account: Account::Model) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.unlock_code = Set(String::new());
    model
}

pub fn lock_transition(account: Account::Model, unlock_code: String) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.unlock_code = Set(unlock_code);
    model
}

pub fn recovery_code_transition(
    account: Account::Model,
    code: String,
    now: DateTime<Utc>,
) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.recovery_code = Set(code);
    model.recovery_datetime = Set(Some(now));
    model
}

pub fn delete_code_transition(
    account: Account::Model,
    code: String,
    now: DateTime<Utc>,
) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.delete_code = Set(code);
    model.delete_datetime = Set(Some(now));
    model
}

pub fn clear_delete_code(account: Account::Model) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.delete_code = Set(String::new());
    model.delete_datetime = Set(None);
    model
}

pub fn reminder_transition(account: Account::Model, now: DateTime<Utc>) -> Account::ActiveModel {
    let mut model = account.into_active_model();
    model.reminder_datetime = Set(Some(now));
    model
}
