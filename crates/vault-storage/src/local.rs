use crate::traits::{ByteStream, StagedBlob, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempPath;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

const STAGING_DIR: &str = ".staging";
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
///
/// Published blobs live under `base_path`; staged writes live in `base_path/.staging` so the
/// final rename never crosses a filesystem boundary.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR);

        fs::create_dir_all(&staging_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            staging_path,
        })
    }

    /// Remove staged files left behind by a crash. Returns how many were removed.
    pub async fn purge_staging(&self) -> StorageResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.staging_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::warn!(
                removed,
                path = %self.staging_path.display(),
                "Removed abandoned staged uploads"
            );
        }
        Ok(removed)
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys that could escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.starts_with(STAGING_DIR)
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Staged write backed by a temp file in the staging directory.
pub struct LocalStagedBlob {
    key: String,
    final_path: PathBuf,
    writer: BufWriter<fs::File>,
    temp_path: Option<TempPath>,
    written: u64,
    sealed: bool,
    started: Instant,
}

#[async_trait]
impl StagedBlob for LocalStagedBlob {
    fn key(&self) -> &str {
        &self.key
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        if self.temp_path.is_none() {
            return Err(StorageError::WriteFailed(format!(
                "Blob {} is already published",
                self.key
            )));
        }
        self.writer.write_all(chunk).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write staged blob {}: {}", self.key, e))
        })?;
        self.written += chunk.len() as u64;
        self.sealed = false;
        Ok(())
    }

    async fn seal(&mut self) -> StorageResult<()> {
        if self.temp_path.is_none() {
            return Err(StorageError::WriteFailed(format!(
                "Blob {} is already published",
                self.key
            )));
        }
        if self.sealed {
            return Ok(());
        }
        self.writer.flush().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to flush staged blob {}: {}", self.key, e))
        })?;
        self.writer.get_ref().sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync staged blob {}: {}", self.key, e))
        })?;
        self.sealed = true;
        Ok(())
    }

    async fn publish(&mut self) -> StorageResult<()> {
        self.seal().await?;
        let temp_path = self.temp_path.take().ok_or_else(|| {
            StorageError::WriteFailed(format!("Blob {} is already published", self.key))
        })?;

        let final_path = self.final_path.clone();
        tokio::task::spawn_blocking(move || temp_path.persist(final_path))
            .await
            .map_err(|e| StorageError::BackendError(format!("Publish task failed: {}", e)))?
            .map_err(|e| {
                StorageError::WriteFailed(format!("Failed to publish blob {}: {}", self.key, e.error))
            })?;

        tracing::info!(
            key = %self.key,
            size_bytes = self.written,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Local storage blob published"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn stage(&self, storage_key: &str) -> StorageResult<Box<dyn StagedBlob>> {
        let final_path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&final_path).await?;

        let staging_path = self.staging_path.clone();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("upload-")
                .suffix(".part")
                .tempfile_in(staging_path)
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("Staging task failed: {}", e)))?
        .map_err(|e| StorageError::WriteFailed(format!("Failed to create staged blob: {}", e)))?;

        let (file, temp_path) = named.into_parts();

        Ok(Box::new(LocalStagedBlob {
            key: storage_key.to_string(),
            final_path,
            writer: BufWriter::new(fs::File::from_std(file)),
            temp_path: Some(temp_path),
            written: 0,
            sealed: false,
            started: Instant::now(),
        }))
    }

    async fn open_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(storage_key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open blob {}: {}",
                    storage_key, e
                )));
            }
        };

        let key = storage_key.to_string();
        let stream = tokio_util::io::ReaderStream::with_capacity(file, READ_CHUNK_SIZE).map(
            move |result| {
                result.map_err(|e| {
                    tracing::error!(key = %key, error = %e, "Local storage stream read error");
                    StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
                })
            },
        );

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete blob {}: {}",
                    storage_key, e
                )));
            }
        }

        tracing::info!(
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn check_health(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.staging_path).await?;
        if !meta.is_dir() {
            return Err(StorageError::ConfigError(
                "Staging path is not a directory".to_string(),
            ));
        }
        Ok(())
    }
}
