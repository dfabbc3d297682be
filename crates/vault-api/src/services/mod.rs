//! File vault operations
//!
//! Handlers stay thin: they translate HTTP into calls on [`FileVault`] and render the
//! result. Every operation runs the access gate before it touches the record store or
//! the blob store.

pub mod download;
pub mod share;
pub mod upload;

pub use download::{DecryptedDownload, FileSelector};

use std::sync::Arc;
use uuid::Uuid;
use vault_core::{authorize, AppError, Clock, FileRecord, Operation, Requester};
use vault_db::FileRepository;
use vault_storage::Storage;

#[derive(Clone)]
pub struct FileVault {
    files: FileRepository,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl FileVault {
    pub fn new(files: FileRepository, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            files,
            storage,
            clock,
        }
    }

    pub fn files(&self) -> &FileRepository {
        &self.files
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// The caller's records, newest first.
    pub async fn list(&self, requester: &Requester) -> Result<Vec<FileRecord>, AppError> {
        authorize(requester, Operation::List, None)?;
        let owner = requester.require_owner()?;
        self.files.list_by_owner(owner).await
    }

    /// Load a record by id and run the owner check for `operation`.
    async fn load_owned(
        &self,
        id: Uuid,
        requester: &Requester,
        operation: Operation,
    ) -> Result<FileRecord, AppError> {
        authorize(requester, operation, None)?;
        let record = self
            .files
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        authorize(requester, operation, Some(&record))?;
        Ok(record)
    }

    /// Remove the ciphertext, then the record.
    ///
    /// A missing blob is not an error, so a delete that failed between the two steps can
    /// simply be retried.
    #[tracing::instrument(skip(self, requester), fields(file_id = %id))]
    pub async fn delete(&self, id: Uuid, requester: &Requester) -> Result<(), AppError> {
        let record = self.load_owned(id, requester, Operation::Delete).await?;

        self.storage.delete(&record.storage_location).await?;
        if !self.files.delete(id).await? {
            tracing::debug!("Record already removed by a concurrent delete");
        }

        tracing::info!(owner_id = %record.owner_id, "File deleted");
        Ok(())
    }
}
