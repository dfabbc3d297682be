use super::FileVault;
use uuid::Uuid;
use vault_core::{AppError, FileRecord, Operation, Requester, ShareState, ShareToken};

use crate::constants::API_PREFIX;

impl FileVault {
    /// Issue a fresh share token for one of the requester's files.
    ///
    /// Any earlier token on the record stops resolving as soon as this returns.
    #[tracing::instrument(skip(self, requester), fields(file_id = %id))]
    pub async fn issue_share(
        &self,
        id: Uuid,
        requester: &Requester,
    ) -> Result<FileRecord, AppError> {
        let mut record = self
            .load_owned(id, requester, Operation::IssueShare)
            .await?;

        let share = ShareState::issue(self.clock.now());
        if !self.files.set_share(id, &share).await? {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        tracing::info!(expires_at = ?share.expires_at(), "Share link issued");
        record.share = share;
        Ok(record)
    }
}

/// Public URL that downloads the file behind `token`.
pub fn share_url(public_base_url: &str, token: &ShareToken) -> String {
    format!(
        "{}{}/files/download/shared/{}",
        public_base_url.trim_end_matches('/'),
        API_PREFIX,
        token.as_str()
    )
}
