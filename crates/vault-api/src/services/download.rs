//! Download pipeline: stored ciphertext in, plaintext stream out.

use super::FileVault;
use bytes::Bytes;
use futures::StreamExt;
use vault_core::{authorize, AppError, FileRecord, Operation, Requester, StreamDecryptor};
use vault_storage::{ByteStream, StorageError};

/// How a download names its file
#[derive(Debug, Clone)]
pub enum FileSelector {
    /// Owner download by record id
    Id(uuid::Uuid),
    /// Anonymous download through a share token
    ShareToken(String),
}

/// A record and its plaintext, produced lazily as the caller polls `body`.
pub struct DecryptedDownload {
    pub record: FileRecord,
    pub body: ByteStream,
}

impl FileVault {
    /// Resolve `selector`, run the gate, and open a decrypting stream over the ciphertext.
    ///
    /// Nothing is read from storage until the body is polled; dropping the body releases
    /// the underlying file handle.
    pub async fn fetch(
        &self,
        selector: FileSelector,
        requester: &Requester,
    ) -> Result<DecryptedDownload, AppError> {
        let record = match selector {
            FileSelector::Id(id) => {
                self.load_owned(id, requester, Operation::OwnerDownload)
                    .await?
            }
            FileSelector::ShareToken(token) => {
                let record = self
                    .files
                    .get_by_share_token(&token)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound("File not found or invalid link".to_string())
                    })?;
                authorize(requester, Operation::SharedDownload, Some(&record))?;
                record.share.check_access(self.clock.now())?;
                record
            }
        };

        let ciphertext = self.storage.open_stream(&record.storage_location).await?;
        let decryptor = StreamDecryptor::new(&record.encryption_key, &record.iv)?;

        tracing::info!(
            file_id = %record.id,
            size_bytes = record.size_bytes,
            "Streaming decrypted file"
        );
        Ok(DecryptedDownload {
            body: decrypt_stream(ciphertext, decryptor),
            record,
        })
    }
}

struct DecryptState {
    ciphertext: ByteStream,
    decryptor: Option<StreamDecryptor>,
}

/// Adapt a ciphertext stream into a plaintext stream. Padding is checked when the
/// ciphertext ends; a bad tail surfaces as a stream error after the earlier chunks.
fn decrypt_stream(ciphertext: ByteStream, decryptor: StreamDecryptor) -> ByteStream {
    let state = DecryptState {
        ciphertext,
        decryptor: Some(decryptor),
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            let decryptor = state.decryptor.as_mut()?;
            match state.ciphertext.next().await {
                Some(Ok(chunk)) => {
                    let plaintext = decryptor.update(&chunk);
                    if !plaintext.is_empty() {
                        return Some((Ok(Bytes::from(plaintext)), state));
                    }
                }
                Some(Err(e)) => {
                    state.decryptor = None;
                    return Some((Err(e), state));
                }
                None => {
                    let decryptor = state.decryptor.take()?;
                    return match decryptor.finalize() {
                        Ok(tail) if tail.is_empty() => None,
                        Ok(tail) => Some((Ok(Bytes::from(tail)), state)),
                        Err(e) => {
                            tracing::error!(error = %e, "Stored ciphertext failed to decrypt");
                            Some((
                                Err(StorageError::ReadFailed(format!(
                                    "Ciphertext could not be decrypted: {}",
                                    e
                                ))),
                                state,
                            ))
                        }
                    };
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use vault_core::{EncryptionKey, Iv, StreamEncryptor};

    fn encrypt(key: &EncryptionKey, iv: &Iv, plaintext: &[u8]) -> Vec<u8> {
        let mut enc = StreamEncryptor::new(key, iv).unwrap();
        let mut out = enc.update(plaintext);
        out.extend(enc.finalize().unwrap());
        out
    }

    fn chunked(data: Vec<u8>, size: usize) -> ByteStream {
        let chunks: Vec<Result<Bytes, StorageError>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    async fn collect(mut body: ByteStream) -> Result<Vec<u8>, StorageError> {
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_decrypts_across_odd_chunk_boundaries() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let plaintext: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let ciphertext = encrypt(&key, &iv, &plaintext);

        let body = decrypt_stream(
            chunked(ciphertext, 7),
            StreamDecryptor::new(&key, &iv).unwrap(),
        );
        assert_eq!(collect(body).await.unwrap(), plaintext);
    }

    #[tokio::test]
    async fn test_empty_plaintext_yields_no_bytes() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let body = decrypt_stream(
            chunked(encrypt(&key, &iv, b""), 16),
            StreamDecryptor::new(&key, &iv).unwrap(),
        );
        assert!(collect(body).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_ciphertext_errors_at_end() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let mut ciphertext = encrypt(&key, &iv, &[42u8; 100]);
        ciphertext.truncate(ciphertext.len() - 5);

        let body = decrypt_stream(
            chunked(ciphertext, 32),
            StreamDecryptor::new(&key, &iv).unwrap(),
        );
        assert!(matches!(
            collect(body).await,
            Err(StorageError::ReadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let key = EncryptionKey::generate();
        let iv = Iv::generate();
        let items: Vec<Result<Bytes, StorageError>> = vec![
            Ok(Bytes::from_static(&[0u8; 32])),
            Err(StorageError::ReadFailed("disk went away".to_string())),
            Ok(Bytes::from_static(&[0u8; 32])),
        ];
        let mut body = decrypt_stream(
            Box::pin(stream::iter(items)),
            StreamDecryptor::new(&key, &iv).unwrap(),
        );

        let mut saw_error = false;
        while let Some(item) = body.next().await {
            if item.is_err() {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
