//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded in the
//! server crate. The server also applies them on startup; this command is for
//! preparing a database ahead of a deploy.

use super::{CliError, connect};

/// Apply pending migrations to the configured database.
pub async fn run() -> Result<(), CliError> {
    let (_, pool) = connect().await?;

    tracing::info!("Running migrations...");
    visitmark_server::db::migrate(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
