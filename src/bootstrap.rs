use crate::config::StreamnestConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub struct BootstrapResources {
    pub database: Database,
    pub directories_created: Vec<PathBuf>,
    pub database_initialized: bool,
}

/// Prepares everything the backend needs on disk: the directory layout, the
/// database file, and its schema.
pub fn initialize(config: &StreamnestConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    for dir in [
        &config.paths.base,
        &config.paths.data_dir,
        &config.paths.logs_dir,
    ] {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
            directories_created.push(dir.clone());
        }
    }

    let database = Database::connect(&config.paths)?;
    let database_initialized = database.ensure_migrations()?;

    Ok(BootstrapResources {
        database,
        directories_created,
        database_initialized,
    })
}
