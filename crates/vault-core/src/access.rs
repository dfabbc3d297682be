//! Access gate for vault operations.
//!
//! Runs before any pipeline touches storage. Owner operations need a verified identity
//! and, when a record is targeted, that identity must own it. The public share download
//! passes this gate unconditionally; its check is token resolution plus expiry
//! ([`crate::share::ShareState::check_access`]).

use crate::error::AppError;
use crate::models::{FileRecord, OwnerId};

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Owner(OwnerId),
    Anonymous,
}

impl Requester {
    /// The verified owner, or `Unauthenticated` for anonymous callers.
    pub fn require_owner(&self) -> Result<&OwnerId, AppError> {
        match self {
            Requester::Owner(owner) => Ok(owner),
            Requester::Anonymous => Err(AppError::Unauthenticated(
                "No token, authorization denied".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    List,
    OwnerDownload,
    IssueShare,
    Delete,
    SharedDownload,
}

impl Operation {
    pub fn requires_identity(self) -> bool {
        !matches!(self, Operation::SharedDownload)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::List => "list",
            Operation::OwnerDownload => "owner_download",
            Operation::IssueShare => "issue_share",
            Operation::Delete => "delete",
            Operation::SharedDownload => "shared_download",
        }
    }
}

/// Allow or deny `operation` for `requester`, optionally against a target `record`.
pub fn authorize(
    requester: &Requester,
    operation: Operation,
    record: Option<&FileRecord>,
) -> Result<(), AppError> {
    if !operation.requires_identity() {
        return Ok(());
    }

    let owner = requester.require_owner()?;

    if let Some(record) = record {
        if record.owner_id != *owner {
            tracing::warn!(
                operation = operation.as_str(),
                file_id = %record.id,
                requester = %owner,
                "Denied access to file owned by another user"
            );
            return Err(AppError::Unauthorized("Not authorized".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::{EncryptionKey, Iv};
    use crate::share::ShareState;
    use chrono::Utc;
    use uuid::Uuid;

    fn record_owned_by(owner: &str) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id: OwnerId::new(owner),
            original_name: "notes.txt".to_string(),
            storage_location: "uploads/notes.txt.enc".to_string(),
            size_bytes: 0,
            encryption_key: EncryptionKey::generate(),
            iv: Iv::generate(),
            share: ShareState::NoShare,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let record = record_owned_by("alice");
        let requester = Requester::Owner(OwnerId::new("alice"));
        for op in [
            Operation::OwnerDownload,
            Operation::IssueShare,
            Operation::Delete,
        ] {
            assert!(authorize(&requester, op, Some(&record)).is_ok());
        }
    }

    #[test]
    fn test_other_owner_is_unauthorized() {
        let record = record_owned_by("alice");
        let requester = Requester::Owner(OwnerId::new("bob"));
        assert!(matches!(
            authorize(&requester, Operation::Delete, Some(&record)),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_anonymous_is_unauthenticated_on_owner_operations() {
        for op in [Operation::Upload, Operation::List, Operation::OwnerDownload] {
            assert!(matches!(
                authorize(&Requester::Anonymous, op, None),
                Err(AppError::Unauthenticated(_))
            ));
        }
    }

    #[test]
    fn test_shared_download_needs_no_identity() {
        let record = record_owned_by("alice");
        assert!(authorize(&Requester::Anonymous, Operation::SharedDownload, Some(&record)).is_ok());
    }
}
