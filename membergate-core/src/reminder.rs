use chrono::{DateTime, Utc};
use membergate_common::{AccountsConfig, MembergateError};
use membergate_db_entities::Account;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use tracing::*;
use url::Url;

use crate::expiry::{days_to_delete, deletion_due, reminder_due};
use crate::mail::{templates, Mailer};
use crate::verification::{code_link, reminder_transition, CodeKind};

/// What became of a pending account once a flow touched it.
pub enum PendingOutcome {
    /// The account sat unactivated past its deadline and was removed.
    Deleted,
    Kept {
        account: Account::Model,
        reminder_sent: bool,
    },
}

/// Lazy reminder/expiry evaluation. Called whenever a user-initiated flow
/// touches a pending account; there is no background job.
pub async fn evaluate_pending_account(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    external_url: &Url,
    account: Account::Model,
    now: DateTime<Utc>,
) -> Result<PendingOutcome, MembergateError> {
    if !account.is_pending() {
        return Ok(PendingOutcome::Kept {
            account,
            reminder_sent: false,
        });
    }

    if deletion_due(&account, now, config.remind_days, config.delete_days) {
        info!(username=%account.username, "Removing pending account past its deletion deadline");
        Account::Entity::delete_by_id(account.id).exec(db).await?;
        return Ok(PendingOutcome::Deleted);
    }

    if reminder_due(&account, now, config.remind_days) {
        let (account, reminder_sent) =
            send_reminder(db, config, mailer, external_url, account, now).await?;
        return Ok(PendingOutcome::Kept {
            account,
            reminder_sent,
        });
    }

    Ok(PendingOutcome::Kept {
        account,
        reminder_sent: false,
    })
}

/// Send the pending-account reminder and stamp `reminder_datetime`. Also
/// used directly when a duplicate registration re-sends the reminder.
pub async fn send_reminder(
    db: &DatabaseConnection,
    config: &AccountsConfig,
    mailer: &dyn Mailer,
    external_url: &Url,
    account: Account::Model,
    now: DateTime<Utc>,
) -> Result<(Account::Model, bool), MembergateError> {
    let activation_link = code_link(external_url, CodeKind::Activation, &account.activation_code)?;
    let not_registered_link =
        code_link(external_url, CodeKind::NotRegistered, &account.activation_code)?;
    let days = days_to_delete(account.created, now, config.delete_days);

    let mail = templates::reminder_mail(
        &account.language,
        &account.username,
        &activation_link,
        &not_registered_link,
        days,
    );

    match mailer.send(&account.email, mail).await {
        Ok(()) => {
            let account = reminder_transition(account, now).update(db).await?;
            Ok((account, true))
        }
        Err(error) => {
            error!(username=%account.username, %error, "Failed to send pending-account reminder");
            Ok((account, false))
        }
    }
}
