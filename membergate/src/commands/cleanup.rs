use anyhow::Result;
use membergate_core::db::{cleanup_db, connect_to_db};
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    let db = connect_to_db(&config).await?;

    let stats = cleanup_db(&db, &config).await?;
    info!(
        pending_removed = stats.expired_pending_accounts_removed,
        delete_codes_cleared = stats.expired_delete_codes_cleared,
        "Cleanup finished"
    );
    Ok(())
}
