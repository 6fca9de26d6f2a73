use anyhow::Result;
use model::users::UserManager;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

pub async fn create_superuser(
    database_url: &str,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<()> {
    trace!("Entering create_superuser function");
    debug!("Database URL: {}", database_url);

    let db = match Database::connect(database_url).await {
        Ok(connection) => {
            debug!("Database connection established");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    let manager = UserManager::new(bcrypt_cost);
    match manager.create_superuser(&db, Some(email), password).await {
        Ok(user) => {
            info!("Superuser {} created with ID {}", user.email, user.id);
            Ok(())
        }
        Err(e) => {
            error!("Failed to create superuser {}: {}", email, e);
            Err(e.into())
        }
    }
}
