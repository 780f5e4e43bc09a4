use crate::api;
use crate::bootstrap::{self, BootstrapResources};
use crate::config::StreamnestConfig;
use crate::database::Database;
use anyhow::Result;

/// Convenience wrapper that bootstraps the backend once and hands out
/// cloned handles for whichever entrypoint (REST server, admin CLI) needs
/// them.
pub struct BackendNode {
    config: StreamnestConfig,
    bootstrap: BootstrapResources,
}

impl BackendNode {
    pub fn start(config: StreamnestConfig) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config)?;

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            db_path = %config.paths.db_path.display(),
            "streamnest node initialized"
        );

        Ok(Self { config, bootstrap })
    }

    /// Returns a clone of the database handle.
    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }

    /// Runs the REST API server until shutdown.
    pub async fn run_http_server(&self) -> Result<()> {
        api::serve_http(self.config.clone(), self.database()).await
    }
}
