//! Vault Core Library
//!
//! This crate provides the domain model, error types, configuration and the
//! cryptographic building blocks shared by every vault component: the streaming
//! AES-256-CBC transform, per-file key material, share tokens and the access gate.

pub mod access;
pub mod clock;
pub mod config;
pub mod encryption;
pub mod error;
pub mod models;
pub mod share;

// Re-export commonly used types
pub use access::{authorize, Operation, Requester};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BaseConfig, Config, LogFormat, VaultConfig};
pub use encryption::{CipherError, EncryptionKey, Iv, StreamDecryptor, StreamEncryptor};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileRecord, FileRecordResponse, FileSummary, OwnerId};
pub use share::{ShareState, ShareToken, SHARE_LINK_TTL_HOURS};
