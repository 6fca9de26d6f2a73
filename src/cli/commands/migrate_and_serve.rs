use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use tracing::{debug, error, info, trace};

use super::serve::run_server;
use crate::config::{initialize_app_state, AppConfig};

pub async fn migrate_and_serve(config: &AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", config.database_url);
    debug!("Bind address: {}", config.bind_address);

    trace!("Initializing application state");
    let state = match initialize_app_state(config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // Migrate over the same connection the server uses
    info!("Running database migrations");
    trace!("Executing migration up command");
    match Migrator::up(&state.db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    run_server(state, &config.bind_address).await
}
