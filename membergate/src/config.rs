use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use membergate_common::helpers::fs::secure_file;
use membergate_common::{MembergateConfig, MembergateConfigStore};
use tracing::*;

pub fn load_config(path: &Path, secure: bool) -> Result<MembergateConfig> {
    if secure {
        secure_file(path).context("Could not secure config")?;
    }

    let store: MembergateConfigStore = Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix("MEMBERGATE"))
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    let config = MembergateConfig {
        store,
        paths_relative_to: path
            .parent()
            .context("Config file has no parent directory")?
            .to_path_buf(),
    };

    config.validate();

    info!("Using config: {path:?}");
    Ok(config)
}
