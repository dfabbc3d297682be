//! Vault Storage Library
//!
//! Durable storage for ciphertext blobs. Writes are staged: bytes go to a temporary file
//! first and only appear under their final key when the caller publishes them, so a
//! reader never observes a partially written blob.
//!
//! # Storage key format
//!
//! `uploads/{created_at_millis}-{file_id}-{sanitized_name}.enc`
//!
//! The key is an operational convenience; the file record is authoritative. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the `keys` module.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::generate_storage_key;
pub use local::LocalStorage;
pub use traits::{ByteStream, StagedBlob, Storage, StorageError, StorageResult};
