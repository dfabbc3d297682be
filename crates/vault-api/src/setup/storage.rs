//! Blob store setup

use anyhow::{Context, Result};
use std::sync::Arc;
use vault_core::Config;
use vault_storage::{LocalStorage, Storage};

/// Open the local blob store and clear staged writes left by an earlier crash.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.storage_path().clone())
        .await
        .context("Failed to initialize local storage")?;

    let purged = storage
        .purge_staging()
        .await
        .context("Failed to clear staging area")?;
    tracing::info!(
        path = %config.storage_path().display(),
        purged,
        "Local storage ready"
    );

    Ok(Arc::new(storage))
}
