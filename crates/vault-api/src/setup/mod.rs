//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::JwtService;
use crate::services::FileVault;
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vault_core::{Config, SystemClock};
use vault_db::FileRepository;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    crate::error::configure_error_details(config.is_production());

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let vault = FileVault::new(
        FileRepository::new(pool),
        storage,
        Arc::new(SystemClock),
    );
    let state = Arc::new(AppState {
        vault,
        jwt: JwtService::new(config.jwt_secret()),
        public_base_url: config.public_base_url().to_string(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
