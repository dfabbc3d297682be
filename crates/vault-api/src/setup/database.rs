//! Database setup and initialization

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use vault_core::Config;

/// Open the pool and apply pending migrations.
pub async fn setup_database(config: &Config) -> Result<SqlitePool> {
    tracing::info!(
        max_connections = config.db_max_connections(),
        "Connecting to database"
    );

    let pool = vault_db::connect(
        config.database_url(),
        config.db_max_connections(),
        Duration::from_secs(config.db_timeout_seconds()),
    )
    .await
    .context("Failed to connect to database")?;

    tracing::info!("Database migrations completed");
    Ok(pool)
}
