//! File metadata persistence and presigned-URL issuance.
//!
//! Records are created when an upload URL is requested, so a record exists
//! before its bytes do. The storage key is derived server-side from the
//! owner, a fresh record id, and the sanitized filename; it is never
//! accepted from client input.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::file::{
    FileCreate, FileDownloadResponse, FileRecord, FileUpdate, FileUploadResponse,
};
use crate::services::object_gateway::ObjectGateway;
use crate::services::user_service::is_unique_violation;

const MAX_FILENAME_LEN: usize = 255;
const MAX_PAGE_SIZE: i64 = 100;

const SELECT_COLUMNS: &str = "SELECT id, filename, storage_key, content_type, size_bytes, \
     description, is_public, owner_id, created_at, updated_at FROM files";

/// Metadata CRUD plus upload/download grant issuance.
#[derive(Clone)]
pub struct FileService {
    db: Arc<SqlitePool>,
    gateway: ObjectGateway,
}

impl FileService {
    pub fn new(db: Arc<SqlitePool>, gateway: ObjectGateway) -> Self {
        Self { db, gateway }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, ApiError> {
        let record = sqlx::query_as::<_, FileRecord>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(record)
    }

    /// Page through a user's records, newest first. `limit` is clamped so a
    /// single request cannot ask for an unbounded response.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<FileRecord>, ApiError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let skip = skip.max(0);
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = ? ORDER BY created_at DESC, id ASC \
             LIMIT ? OFFSET ?"
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&*self.db)
        .await?;
        Ok(records)
    }

    /// Create the metadata record and mint the matching upload grant as one
    /// operation. If presigning fails the record is rolled back so no
    /// orphan row remains.
    pub async fn create_upload_url(
        &self,
        info: FileCreate,
        owner_id: Uuid,
    ) -> Result<FileUploadResponse, ApiError> {
        let record = self.create(info, owner_id).await?;

        match self
            .gateway
            .mint_upload_url(&record.storage_key, &record.content_type)
            .await
        {
            Ok(upload_url) => Ok(FileUploadResponse {
                upload_url,
                file_id: record.id,
            }),
            Err(err) => {
                // Roll the reservation back; the client never saw the id.
                self.delete_row(record.id).await?;
                Err(err.into())
            }
        }
    }

    /// Mint a download grant for an already-authorized record.
    pub async fn create_download_url(
        &self,
        record: &FileRecord,
    ) -> Result<FileDownloadResponse, ApiError> {
        let download_url = self.gateway.mint_download_url(&record.storage_key).await?;
        Ok(FileDownloadResponse {
            download_url,
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
        })
    }

    /// Insert a new record with a server-generated storage key.
    pub async fn create(&self, info: FileCreate, owner_id: Uuid) -> Result<FileRecord, ApiError> {
        validate_file_info(&info)?;

        let file_id = Uuid::new_v4();
        let storage_key = format!("{}/{}/{}", owner_id, file_id, info.filename);
        let now = Utc::now();

        let result = sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files (id, filename, storage_key, content_type, size_bytes, \
             description, is_public, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, filename, storage_key, content_type, size_bytes, description, \
             is_public, owner_id, created_at, updated_at",
        )
        .bind(file_id)
        .bind(&info.filename)
        .bind(&storage_key)
        .bind(&info.content_type)
        .bind(info.size_bytes)
        .bind(&info.description)
        .bind(info.is_public)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match result {
            Ok(record) => Ok(record),
            // The key embeds a fresh UUID, so a collision means something is
            // deeply wrong; surface it rather than papering over it.
            Err(err) if is_unique_violation(&err) => Err(ApiError::Internal(
                "storage key collision on insert".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a partial metadata update. Ownership and storage key never
    /// change after creation.
    pub async fn update(
        &self,
        record: &FileRecord,
        changes: FileUpdate,
    ) -> Result<FileRecord, ApiError> {
        let filename = match changes.filename {
            Some(filename) => {
                validate_filename(&filename)?;
                filename
            }
            None => record.filename.clone(),
        };
        let description = changes.description.or_else(|| record.description.clone());
        let is_public = changes.is_public.unwrap_or(record.is_public);

        let updated = sqlx::query_as::<_, FileRecord>(
            "UPDATE files SET filename = ?, description = ?, is_public = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING id, filename, storage_key, content_type, size_bytes, description, \
             is_public, owner_id, created_at, updated_at",
        )
        .bind(&filename)
        .bind(&description)
        .bind(is_public)
        .bind(Utc::now())
        .bind(record.id)
        .fetch_one(&*self.db)
        .await?;
        Ok(updated)
    }

    /// Delete the record and reclaim the backing object. Object deletion is
    /// best-effort: the bytes may never have been uploaded, and a stale
    /// object is preferable to a record that cannot be removed.
    pub async fn remove(&self, record: &FileRecord) -> Result<(), ApiError> {
        if let Err(err) = self.gateway.delete_object(&record.storage_key).await {
            tracing::warn!(
                storage_key = %record.storage_key,
                error = %err,
                "failed to reclaim backing object, removing metadata anyway"
            );
        }
        self.delete_row(record.id).await
    }

    async fn delete_row(&self, id: Uuid) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }
}

fn validate_file_info(info: &FileCreate) -> Result<(), ApiError> {
    validate_filename(&info.filename)?;
    if info.content_type.trim().is_empty() {
        return Err(ApiError::Validation("content_type must not be empty".into()));
    }
    if info.size_bytes <= 0 {
        return Err(ApiError::Validation("size_bytes must be positive".into()));
    }
    Ok(())
}

/// Reject names that would corrupt the derived storage key or smuggle in
/// path components.
fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
        return Err(ApiError::Validation(
            "filename must be between 1 and 255 characters".into(),
        ));
    }
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::Validation(
            "filename must not contain path separators".into(),
        ));
    }
    if filename.bytes().any(|b| b.is_ascii_control()) {
        return Err(ApiError::Validation(
            "filename must not contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::user::UserCreate;
    use crate::services::user_service::UserService;
    use aws_sdk_s3::config::{Credentials, Region};
    use std::time::Duration;

    fn test_gateway() -> ObjectGateway {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "test"))
            .endpoint_url("http://localhost:9000")
            .force_path_style(true)
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .build();
        ObjectGateway::new(
            aws_sdk_s3::Client::from_conf(config),
            "test-bucket",
            Duration::from_secs(3600),
        )
    }

    async fn setup() -> (FileService, Uuid) {
        let db = Arc::new(test_pool().await);
        let users = UserService::new(db.clone());
        let owner = users
            .create(UserCreate {
                email: "owner@x.com".into(),
                password: "pw".into(),
                full_name: None,
                is_superuser: false,
            })
            .await
            .unwrap();
        (FileService::new(db, test_gateway()), owner.id)
    }

    fn file_in(filename: &str) -> FileCreate {
        FileCreate {
            filename: filename.into(),
            content_type: "text/plain".into(),
            size_bytes: 42,
            description: None,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn storage_key_is_server_generated_and_unique() {
        let (service, owner) = setup().await;

        let a = service.create(file_in("report.txt"), owner).await.unwrap();
        let b = service.create(file_in("report.txt"), owner).await.unwrap();

        assert_ne!(a.storage_key, b.storage_key);
        assert!(a.storage_key.starts_with(&format!("{}/", owner)));
        assert!(a.storage_key.ends_with("/report.txt"));
        assert_eq!(a.owner_id, owner);
    }

    #[tokio::test]
    async fn rejects_invalid_metadata() {
        let (service, owner) = setup().await;

        for bad in ["", "../etc/passwd", "a/b.txt", "a\\b.txt"] {
            let err = service.create(file_in(bad), owner).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "filename {:?}", bad);
        }

        let mut info = file_in("ok.txt");
        info.size_bytes = 0;
        assert!(matches!(
            service.create(info, owner).await,
            Err(ApiError::Validation(_))
        ));

        let mut info = file_in("ok.txt");
        info.content_type = " ".into();
        assert!(matches!(
            service.create(info, owner).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn pagination_windows_are_disjoint() {
        let (service, owner) = setup().await;
        for i in 0..25 {
            service
                .create(file_in(&format!("f{i:02}.txt")), owner)
                .await
                .unwrap();
        }

        let first = service.list_by_owner(owner, 0, 10).await.unwrap();
        let second = service.list_by_owner(owner, 10, 10).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);

        let first_ids: Vec<Uuid> = first.iter().map(|r| r.id).collect();
        assert!(second.iter().all(|r| !first_ids.contains(&r.id)));

        // Re-running the same window returns the same page.
        let again = service.list_by_owner(owner, 0, 10).await.unwrap();
        let again_ids: Vec<Uuid> = again.iter().map(|r| r.id).collect();
        assert_eq!(first_ids, again_ids);
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let (service, owner) = setup().await;
        for i in 0..110 {
            service
                .create(file_in(&format!("f{i:03}.txt")), owner)
                .await
                .unwrap();
        }
        let page = service.list_by_owner(owner, 0, 10_000).await.unwrap();
        assert_eq!(page.len(), 100);
    }

    #[tokio::test]
    async fn update_touches_only_mutable_fields() {
        let (service, owner) = setup().await;
        let record = service.create(file_in("old.txt"), owner).await.unwrap();

        let updated = service
            .update(
                &record,
                FileUpdate {
                    filename: Some("new.txt".into()),
                    description: Some("notes".into()),
                    is_public: Some(true),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.filename, "new.txt");
        assert_eq!(updated.description.as_deref(), Some("notes"));
        assert!(updated.is_public);
        // Identity, ownership, and storage key survive the rename.
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.owner_id, record.owner_id);
        assert_eq!(updated.storage_key, record.storage_key);
    }

    #[tokio::test]
    async fn upload_grant_reserves_a_record() {
        let (service, owner) = setup().await;
        let response = service
            .create_upload_url(file_in("data.bin"), owner)
            .await
            .unwrap();

        assert!(response.upload_url.contains("X-Amz-Signature="));
        let record = service.get(response.file_id).await.unwrap().unwrap();
        assert!(response.upload_url.contains(&record.storage_key));
    }

    #[tokio::test]
    async fn visibility_gates_strangers_but_not_admins() {
        use crate::policy::{Decision, FileAction, authorize};

        let db = Arc::new(test_pool().await);
        let users = UserService::new(db.clone());
        let service = FileService::new(db, test_gateway());

        let alice = users
            .create(UserCreate {
                email: "a@x.com".into(),
                password: "pw".into(),
                full_name: None,
                is_superuser: false,
            })
            .await
            .unwrap();
        let bob = users
            .create(UserCreate {
                email: "b@y.com".into(),
                password: "pw".into(),
                full_name: None,
                is_superuser: false,
            })
            .await
            .unwrap();

        let f1 = service.create(file_in("f1.txt"), alice.id).await.unwrap();
        let bob_actor = crate::policy::Actor { id: bob.id, is_admin: false };

        // Private record: bob is denied every operation.
        for action in [
            FileAction::ReadMetadata,
            FileAction::Download,
            FileAction::UpdateMetadata,
            FileAction::Delete,
        ] {
            assert_eq!(
                authorize(bob_actor, f1.owner_id, f1.is_public, action),
                Decision::Deny
            );
        }

        // Flip to public: bob may read and download, still not delete.
        let f1 = service
            .update(
                &f1,
                FileUpdate {
                    is_public: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            authorize(bob_actor, f1.owner_id, f1.is_public, FileAction::Download),
            Decision::Allow
        );
        assert_eq!(
            authorize(bob_actor, f1.owner_id, f1.is_public, FileAction::Delete),
            Decision::Deny
        );

        // An admin passes regardless of visibility or ownership.
        let admin = crate::policy::Actor { id: Uuid::new_v4(), is_admin: true };
        assert_eq!(
            authorize(admin, f1.owner_id, false, FileAction::Delete),
            Decision::Allow
        );
    }

    #[tokio::test]
    async fn remove_tolerates_missing_backing_object() {
        let (service, owner) = setup().await;
        let record = service.create(file_in("gone.txt"), owner).await.unwrap();

        // Nothing listens on the test endpoint, so object deletion fails;
        // the metadata row must still go away.
        service.remove(&record).await.unwrap();
        assert!(service.get(record.id).await.unwrap().is_none());
    }
}
