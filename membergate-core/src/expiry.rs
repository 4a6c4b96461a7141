use chrono::{DateTime, Duration, Utc};
use membergate_db_entities::Account;

/// Number shown in reminder mails for a pending account.
///
/// Whole days elapsed since registration plus the configured offset. The
/// figure intentionally grows as the account sits unactivated; it mirrors
/// the date arithmetic the reminder texts have always used.
pub fn days_to_delete(created: DateTime<Utc>, now: DateTime<Utc>, delete_days: u32) -> i64 {
    (now - created).num_days() + i64::from(delete_days)
}

/// Total grace period before an unactivated account is removed.
pub fn deletion_deadline(remind_days: u32, delete_days: u32) -> Duration {
    Duration::days(i64::from(remind_days) + i64::from(delete_days))
}

/// A pending account is reminded once the reminder window has elapsed and no
/// reminder was stamped yet.
pub fn reminder_due(account: &Account::Model, now: DateTime<Utc>, remind_days: u32) -> bool {
    account.is_pending()
        && account.reminder_datetime.is_none()
        && now - account.created >= Duration::days(i64::from(remind_days))
}

/// A pending account is removed once the full grace period has elapsed.
pub fn deletion_due(
    account: &Account::Model,
    now: DateTime<Utc>,
    remind_days: u32,
    delete_days: u32,
) -> bool {
    account.is_pending() && now - account.created >= deletion_deadline(remind_days, delete_days)
}
