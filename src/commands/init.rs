//! Init command implementation

use crate::config::{Config, PathsConfig};
use crate::error::{Error, Result};
use crate::meta::MetaDb;
use crate::store::QdrantStore;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub force: bool,
}

/// Write a default configuration file, refusing to overwrite without `force`
pub fn write_initial_config(options: &InitOptions) -> Result<Config> {
    if options.config_path.exists() && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            options.config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths = PathsConfig {
        base_dir: options.base_dir.clone(),
        config_file: options.config_path.clone(),
        db_file: options.base_dir.join("sqlbot.db"),
    };
    config.validate()?;
    config.save()?;
    Ok(config)
}

/// Initialize sqlbot configuration, catalog database and vector collection
pub async fn cmd_init(options: InitOptions) -> Result<Config> {
    let config = write_initial_config(&options)?;
    info!("Created config at {:?}", config.paths.config_file);

    let db = MetaDb::connect(&config).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    match QdrantStore::connect(&config) {
        Ok(store) => match store.ensure_collection().await {
            Ok(()) => info!("Qdrant collection '{}' ready", config.collection_name),
            Err(e) => warn!(
                "Could not create Qdrant collection: {}. Run 'sqlbot db init' once Qdrant is running.",
                e
            ),
        },
        Err(e) => warn!(
            "Could not connect to Qdrant at {}: {}. Make sure Qdrant is running.",
            config.qdrant_url, e
        ),
    }

    Ok(config)
}
