//! CLI subcommands.

pub mod customers;
pub mod migrate;

use sqlx::SqlitePool;
use thiserror::Error;
use visitmark_server::ServerConfig;
use visitmark_server::config::ConfigError;
use visitmark_server::services::LoyaltyError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Customer operation failed.
    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),
}

/// Load configuration and open the configured database.
async fn connect() -> Result<(ServerConfig, SqlitePool), CliError> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = visitmark_server::db::create_pool(&config.database_url).await?;

    Ok((config, pool))
}
