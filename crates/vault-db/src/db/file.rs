//! File record repository: CRUD for the files table.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;
use vault_core::{AppError, EncryptionKey, FileRecord, Iv, OwnerId, ShareState};

const FILE_COLUMNS: &str = "id, owner_id, original_name, storage_location, size_bytes, \
     encryption_key, iv, share_token, share_expires_at, created_at";

/// Row type for files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub owner_id: String,
    pub original_name: String,
    pub storage_location: String,
    pub size_bytes: i64,
    pub encryption_key: String,
    pub iv: String,
    pub share_token: Option<String>,
    pub share_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FileRow {
    pub fn to_file_record(self) -> Result<FileRecord, AppError> {
        Ok(FileRecord {
            id: self.id,
            owner_id: OwnerId::new(self.owner_id),
            original_name: self.original_name,
            storage_location: self.storage_location,
            size_bytes: u64::try_from(self.size_bytes)
                .map_err(|_| AppError::Internal(format!("negative size for file {}", self.id)))?,
            encryption_key: EncryptionKey::from_hex(&self.encryption_key)?,
            iv: Iv::from_hex(&self.iv)?,
            share: ShareState::from_parts(self.share_token, self.share_expires_at)?,
            created_at: self.created_at,
        })
    }
}

/// Repository for files table.
#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction for a multi-step write (the upload publish).
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    /// Insert a new record within a transaction. Invisible to readers until commit.
    #[tracing::instrument(skip(self, tx, record), fields(db.table = "files", db.record_id = %record.id))]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &FileRecord,
    ) -> Result<(), AppError> {
        let size_bytes = i64::try_from(record.size_bytes)
            .map_err(|_| AppError::PayloadTooLarge("file size out of range".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO files (id, owner_id, original_name, storage_location, size_bytes,
                               encryption_key, iv, share_token, share_expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id.as_str())
        .bind(&record.original_name)
        .bind(&record.storage_location)
        .bind(size_bytes)
        .bind(record.encryption_key.to_hex())
        .bind(record.iv.to_hex())
        .bind(record.share.token().map(|t| t.as_str().to_string()))
        .bind(record.share.expires_at())
        .bind(record.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Fetch a record by id.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRow> = sqlx::query_as::<Sqlite, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = ?",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileRow::to_file_record).transpose()
    }

    /// Fetch the record currently shared under `token`.
    #[tracing::instrument(skip(self, token), fields(db.table = "files"))]
    pub async fn get_by_share_token(&self, token: &str) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRow> = sqlx::query_as::<Sqlite, FileRow>(&format!(
            "SELECT {} FROM files WHERE share_token = ?",
            FILE_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FileRow::to_file_record).transpose()
    }

    /// All records of one owner, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "files", owner_id = %owner_id))]
    pub async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<FileRecord>, AppError> {
        let rows: Vec<FileRow> = sqlx::query_as::<Sqlite, FileRow>(&format!(
            "SELECT {} FROM files WHERE owner_id = ? ORDER BY created_at DESC, id",
            FILE_COLUMNS
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FileRow::to_file_record).collect()
    }

    /// Overwrite the share columns. Returns false if the record no longer exists.
    #[tracing::instrument(skip(self, share), fields(db.table = "files", db.record_id = %id))]
    pub async fn set_share(&self, id: Uuid, share: &ShareState) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE files SET share_token = ?, share_expires_at = ? WHERE id = ?",
        )
        .bind(share.token().map(|t| t.as_str().to_string()))
        .bind(share.expires_at())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a record. Returns false if it was already gone.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    async fn repo() -> FileRepository {
        let pool = crate::connect("sqlite::memory:", 1, StdDuration::from_secs(5))
            .await
            .expect("in-memory database");
        FileRepository::new(pool)
    }

    fn record(owner: &str, name: &str, created_at: DateTime<Utc>) -> FileRecord {
        let id = Uuid::new_v4();
        FileRecord {
            id,
            owner_id: OwnerId::new(owner),
            original_name: name.to_string(),
            storage_location: format!("uploads/{}-{}.enc", id, name),
            size_bytes: 1234,
            encryption_key: EncryptionKey::generate(),
            iv: Iv::generate(),
            share: ShareState::NoShare,
            created_at,
        }
    }

    async fn insert(repo: &FileRepository, record: &FileRecord) {
        let mut tx = repo.begin().await.unwrap();
        repo.insert_tx(&mut tx, record).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repo().await;
        let original = record("alice", "report.pdf", Utc::now());
        insert(&repo, &original).await;

        let fetched = repo.get_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(fetched.owner_id, original.owner_id);
        assert_eq!(fetched.original_name, "report.pdf");
        assert_eq!(fetched.size_bytes, 1234);
        assert_eq!(fetched.encryption_key, original.encryption_key);
        assert_eq!(fetched.iv, original.iv);
        assert_eq!(fetched.share, ShareState::NoShare);
    }

    #[tokio::test]
    async fn test_rolled_back_insert_is_never_visible() {
        let repo = repo().await;
        let original = record("alice", "draft.txt", Utc::now());

        let mut tx = repo.begin().await.unwrap();
        repo.insert_tx(&mut tx, &original).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.get_by_id(original.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_newest_first() {
        let repo = repo().await;
        let now = Utc::now();
        let older = record("alice", "old.txt", now - Duration::minutes(5));
        let newer = record("alice", "new.txt", now);
        let foreign = record("bob", "bob.txt", now);
        for r in [&older, &newer, &foreign] {
            insert(&repo, r).await;
        }

        let listed = repo.list_by_owner(&OwnerId::new("alice")).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, vec!["new.txt", "old.txt"]);
    }

    #[tokio::test]
    async fn test_share_token_lookup_follows_reissue() {
        let repo = repo().await;
        let original = record("alice", "shared.bin", Utc::now());
        insert(&repo, &original).await;

        let first = ShareState::issue(Utc::now());
        assert!(repo.set_share(original.id, &first).await.unwrap());
        let first_token = first.token().unwrap().as_str().to_string();
        let found = repo.get_by_share_token(&first_token).await.unwrap().unwrap();
        assert_eq!(found.id, original.id);
        assert_eq!(found.share.token(), first.token());
        assert_eq!(
            found.share.expires_at().map(|t| t.timestamp_millis()),
            first.expires_at().map(|t| t.timestamp_millis())
        );

        let second = ShareState::issue(Utc::now());
        repo.set_share(original.id, &second).await.unwrap();
        assert!(repo.get_by_share_token(&first_token).await.unwrap().is_none());
        assert!(repo
            .get_by_share_token(second.token().unwrap().as_str())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_set_share_on_missing_record() {
        let repo = repo().await;
        assert!(!repo
            .set_share(Uuid::new_v4(), &ShareState::issue(Utc::now()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let original = record("alice", "gone.txt", Utc::now());
        insert(&repo, &original).await;

        assert!(repo.delete(original.id).await.unwrap());
        assert!(repo.get_by_id(original.id).await.unwrap().is_none());
        assert!(!repo.delete(original.id).await.unwrap());
    }
}
