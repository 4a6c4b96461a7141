mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short)]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run Membergate
    Run,
    /// Create a password hash for use in the config file
    Hash,
    /// Validate config file
    Check,
    /// Sweep expired pending accounts and stale delete codes
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => crate::commands::run::command(&cli).await,
        Commands::Hash => crate::commands::hash::command().await,
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::Cleanup => crate::commands::cleanup::command(&cli).await,
    }
}
