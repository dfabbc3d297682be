use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::encryption::{EncryptionKey, Iv};
use crate::share::ShareState;

/// Verified caller identity, opaque to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored encrypted file. The only persisted entity.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub original_name: String,
    pub storage_location: String,
    pub size_bytes: u64,
    pub encryption_key: EncryptionKey,
    pub iv: Iv,
    pub share: ShareState,
    pub created_at: DateTime<Utc>,
}

/// Upload response body. Carries the key material.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordResponse {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub owner_id: OwnerId,
    pub original_name: String,
    pub storage_location: String,
    pub size_bytes: u64,
    /// 32-byte AES key, hex encoded
    #[schema(value_type = String)]
    pub encryption_key: EncryptionKey,
    /// 16-byte CBC IV, hex encoded
    #[schema(value_type = String)]
    pub iv: Iv,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileRecordResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id.clone(),
            original_name: record.original_name.clone(),
            storage_location: record.storage_location.clone(),
            size_bytes: record.size_bytes,
            encryption_key: record.encryption_key.clone(),
            iv: record.iv.clone(),
            share_token: record.share.token().map(|t| t.as_str().to_string()),
            share_expiry: record.share.expires_at(),
            created_at: record.created_at,
        }
    }
}

/// Listing shape: everything except the key material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub owner_id: OwnerId,
    pub original_name: String,
    pub storage_location: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id.clone(),
            original_name: record.original_name.clone(),
            storage_location: record.storage_location.clone(),
            size_bytes: record.size_bytes,
            share_token: record.share.token().map(|t| t.as_str().to_string()),
            share_expiry: record.share.expires_at(),
            created_at: record.created_at,
        }
    }
}
