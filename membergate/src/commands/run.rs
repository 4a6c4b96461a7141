use anyhow::Result;
use membergate_core::Services;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    info!(%version, "Membergate");

    let config = load_config(&cli.config, true)?;
    let services = Services::new(config).await?;

    tokio::select! {
        result = membergate_web::run_server(services) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt signal received, shutting down");
        }
    }
    Ok(())
}
