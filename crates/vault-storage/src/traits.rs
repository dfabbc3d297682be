//! Storage abstraction trait
//!
//! This module defines the Storage trait that ciphertext backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for vault_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => {
                vault_core::AppError::NotFound("File not found on server".to_string())
            }
            other => vault_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked read of a stored blob
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// A blob being written. Nothing is visible under the key until [`StagedBlob::publish`]
/// succeeds; dropping an unpublished blob discards the written bytes.
#[async_trait]
pub trait StagedBlob: Send {
    /// Key the blob will be published under
    fn key(&self) -> &str;

    /// Bytes written so far
    fn bytes_written(&self) -> u64;

    async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()>;

    /// Flush written bytes to durable storage without publishing them.
    async fn seal(&mut self) -> StorageResult<()>;

    /// Atomically move the blob under its key, sealing it first if needed.
    async fn publish(&mut self) -> StorageResult<()>;
}

/// Storage abstraction trait
///
/// The upload pipeline stages a blob, streams ciphertext into it and publishes it once the
/// owning record is in place. The download pipeline opens a chunked stream.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Begin a staged write for `storage_key`
    async fn stage(&self, storage_key: &str) -> StorageResult<Box<dyn StagedBlob>>;

    /// Stream a published blob in chunks. `NotFound` if nothing is stored under the key.
    async fn open_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Remove a published blob. Removing a missing blob succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Cheap readiness probe for health checks
    async fn check_health(&self) -> StorageResult<()>;
}
