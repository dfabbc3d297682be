//! Upload pipeline: plaintext stream in, encrypted blob plus record out.

use super::FileVault;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;
use vault_core::{
    authorize, AppError, EncryptionKey, FileRecord, Iv, Operation, Requester, ShareState,
    StreamEncryptor,
};
use vault_storage::{generate_storage_key, Storage};

impl FileVault {
    /// Encrypt `body` under a fresh key and IV and store it for the requester.
    ///
    /// Ciphertext goes to a staged blob while the plaintext streams in. Once the body is
    /// exhausted the record is inserted and the blob published inside one transaction, so
    /// a record never exists without its complete ciphertext. Any error, or the caller
    /// dropping this future, discards the staged bytes and any blob published for a record
    /// that did not commit.
    #[tracing::instrument(skip(self, requester, body), fields(file_id))]
    pub async fn ingest<S>(
        &self,
        requester: &Requester,
        original_name: &str,
        body: S,
    ) -> Result<FileRecord, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        authorize(requester, Operation::Upload, None)?;
        let owner_id = requester.require_owner()?.clone();

        let start = Instant::now();
        let id = Uuid::new_v4();
        tracing::Span::current().record("file_id", tracing::field::display(id));
        let created_at = self.clock.now();
        let storage_location = generate_storage_key(created_at, id, original_name);

        let encryption_key = EncryptionKey::generate();
        let iv = Iv::generate();
        let mut encryptor = StreamEncryptor::new(&encryption_key, &iv)?;
        let mut blob = self.storage.stage(&storage_location).await?;

        let mut body = std::pin::pin!(body);
        let mut size_bytes: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            size_bytes += chunk.len() as u64;
            let ciphertext = encryptor.update(&chunk);
            if !ciphertext.is_empty() {
                blob.write_chunk(&ciphertext).await?;
            }
        }
        blob.write_chunk(&encryptor.finalize()?).await?;

        let record = FileRecord {
            id,
            owner_id,
            original_name: original_name.to_string(),
            storage_location,
            size_bytes,
            encryption_key,
            iv,
            share: ShareState::NoShare,
            created_at,
        };

        // fsync happens before the write lock is taken; only the rename runs inside it.
        blob.seal().await?;

        let mut tx = self.files.begin().await?;
        self.files.insert_tx(&mut tx, &record).await?;
        let uncommitted = UncommittedBlob::new(self.storage.clone(), blob.key());
        if let Err(e) = blob.publish().await {
            uncommitted.remove().await;
            return Err(e.into());
        }
        if let Err(e) = tx.commit().await {
            uncommitted.remove().await;
            return Err(e.into());
        }
        uncommitted.keep();

        tracing::info!(
            owner_id = %record.owner_id,
            size_bytes,
            ciphertext_bytes = blob.bytes_written(),
            duration_ms = start.elapsed().as_millis() as u64,
            "File encrypted and stored"
        );
        Ok(record)
    }
}

/// A blob published for a record whose transaction has not committed yet.
///
/// Dropped without [`UncommittedBlob::keep`] (the request future was cancelled), it
/// removes the blob on a background task.
struct UncommittedBlob {
    storage: Arc<dyn Storage>,
    key: Option<String>,
}

impl UncommittedBlob {
    fn new(storage: Arc<dyn Storage>, key: &str) -> Self {
        Self {
            storage,
            key: Some(key.to_string()),
        }
    }

    /// The record committed; the blob stays.
    fn keep(mut self) {
        self.key = None;
    }

    async fn remove(mut self) {
        if let Some(key) = self.key.take() {
            remove_blob(self.storage.as_ref(), &key).await;
        }
    }
}

impl Drop for UncommittedBlob {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let storage = self.storage.clone();
                handle.spawn(async move { remove_blob(storage.as_ref(), &key).await });
            }
            Err(_) => {
                tracing::error!(storage_key = %key, "No runtime to remove uncommitted blob");
            }
        }
    }
}

async fn remove_blob(storage: &dyn Storage, key: &str) {
    match storage.delete(key).await {
        Ok(()) => tracing::warn!(storage_key = %key, "Removed blob of an uncommitted upload"),
        Err(e) => tracing::error!(
            error = %e,
            storage_key = %key,
            "Failed to remove blob of an uncommitted upload"
        ),
    }
}
