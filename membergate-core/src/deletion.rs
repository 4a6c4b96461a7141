use chrono::{DateTime, Utc};
use membergate_common::helpers::codes::generate_code;
use membergate_common::helpers::hash::verify_password_hash;
use membergate_common::{AccountsConfig, MembergateError, Secret};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait};
use tracing::*;
use url::Url;
use uuid::Uuid;

use crate::accounts::find_account_by_id;
use crate::mail::{templates, Mailer};
use crate::verification::{
    code_link, delete_code_transition, ensure_delete_code_fresh, find_account_by_code, CodeKind,
};

/// Authenticated delete request: password re-entry, then the short-lived
/// delete link. The link is mailed first; the code is persisted only when
/// the mail went out.
pub async fn request_deletion(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    external_url: &Url,
    account_id: Uuid,
    password: &Secret<String>,
    now: DateTime<Utc>,
) -> Result<(), MembergateError> {
    let Some(account) = find_account_by_id(db, account_id).await? else {
        return Err(MembergateError::AccountNotFound(account_id.to_string()));
    };

    if !verify_password_hash(password.expose_secret(), &account.password_hash)? {
        return Err(MembergateError::Validation("wrong password".to_owned()));
    }

    let code = generate_code();
    let link = code_link(external_url, CodeKind::DeleteAccount, &code)?;
    let mail = templates::delete_request_mail(&account.language, &account.username, &link);
    mailer.send(&account.email, mail).await?;

    delete_code_transition(account, code, now).update(db).await?;
    Ok(())
}

/// Consume a delete code: password re-entry plus explicit confirmation,
/// within the code's 5-minute window. The account row is removed for good.
pub async fn confirm_deletion(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    code: &str,
    password: &Secret<String>,
    confirmed: bool,
    now: DateTime<Utc>,
) -> Result<(), MembergateError> {
    let account = find_account_by_code(db, CodeKind::DeleteAccount, code).await?;
    let account = ensure_delete_code_fresh(db, account, config.delete_code_ttl, now).await?;

    if !confirmed {
        return Err(MembergateError::Validation(
            "the deletion must be explicitly confirmed".to_owned(),
        ));
    }
    if !verify_password_hash(password.expose_secret(), &account.password_hash)? {
        return Err(MembergateError::Validation("wrong password".to_owned()));
    }

    let username = account.username.clone();
    let email = account.email.clone();
    let language = account.language.clone();
    account.delete(db).await?;
    warn!(username=%username, "Account permanently deleted");

    if !config.suppress_deletion_confirmation {
        let mail = templates::deletion_confirmation_mail(&language, &username);
        if let Err(error) = mailer.send(&email, mail).await {
            error!(username=%username, %error, "Failed to send deletion confirmation");
        }
    }

    Ok(())
}

/// Consume a not-registered code: the recipient never asked for the account,
/// so it is removed without further ceremony.
pub async fn delete_not_registered(
    db: &DatabaseConnection,
    code: &str,
) -> Result<(), MembergateError> {
    let account = find_account_by_code(db, CodeKind::NotRegistered, code).await?;
    info!(username=%account.username, "Removing account via not-registered link");
    membergate_db_entities::Account::Entity::delete_by_id(account.id)
        .exec(db)
        .await?;
    Ok(())
}
