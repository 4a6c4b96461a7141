use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait, Value,
};
use tracing::*;
use membergate_common::helpers::fs::secure_file;
use membergate_common::MembergateConfig;
use membergate_db_entities::Account;
use membergate_db_migrations::migrate_database;

use crate::expiry::deletion_deadline;

pub async fn connect_to_db(config: &MembergateConfig) -> Result<DatabaseConnection> {
    let mut url = url::Url::parse(&config.store.database_url.expose_secret()[..])?;
    if url.scheme() == "sqlite" {
        let path = url.path();
        let mut abs_path = config.paths_relative_to.clone();
        abs_path.push(path);
        abs_path.push("db.sqlite3");

        if let Some(parent) = abs_path.parent() {
            std::fs::create_dir_all(parent)?
        }

        url.set_path(
            abs_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to convert database path to string"))?,
        );

        url.set_query(Some("mode=rwc"));

        let db = Database::connect(ConnectOptions::new(url.to_string())).await?;
        db.begin().await?.commit().await?;
        drop(db);

        secure_file(&abs_path)?;
    }

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let connection = Database::connect(opt).await?;

    migrate_database(&connection).await?;
    Ok(connection)
}

#[derive(Clone, Debug, Default)]
pub struct CleanupStats {
    pub expired_pending_accounts_removed: u64,
    pub expired_delete_codes_cleared: u64,
}

/// Sweep accounts that lazy evaluation never got around to: pending accounts
/// past their deletion deadline, and delete codes past their 5-minute window.
pub async fn cleanup_db(
    db: &DatabaseConnection,
    config: &MembergateConfig,
) -> Result<CleanupStats> {
    let now = Utc::now();
    let accounts = &config.store.accounts;

    let cutoff = now - deletion_deadline(accounts.remind_days, accounts.delete_days);
    let removed = Account::Entity::delete_many()
        .filter(ColumnTrait::ne(&Account::Column::ActivationCode, ""))
        .filter(Account::Column::Created.lt(cutoff))
        .exec(db)
        .await?;

    let delete_cutoff =
        now - chrono::Duration::from_std(accounts.delete_code_ttl).unwrap_or_default();
    let cleared = Account::Entity::update_many()
        .col_expr(Account::Column::DeleteCode, Expr::value(""))
        .col_expr(
            Account::Column::DeleteDatetime,
            Expr::value(Value::ChronoDateTimeUtc(None)),
        )
        .filter(ColumnTrait::ne(&Account::Column::DeleteCode, ""))
        .filter(Account::Column::DeleteDatetime.lt(delete_cutoff))
        .exec(db)
        .await?;

    let stats = CleanupStats {
        expired_pending_accounts_removed: removed.rows_affected,
        expired_delete_codes_cleared: cleared.rows_affected,
    };

    if stats.expired_pending_accounts_removed > 0 || stats.expired_delete_codes_cleared > 0 {
        info!(
            pending_removed = stats.expired_pending_accounts_removed,
            delete_codes_cleared = stats.expired_delete_codes_cleared,
            "Account cleanup completed"
        );
    }

    Ok(stats)
}
