//! File metadata records and the request/response shapes around them.
//!
//! A record describes a file living in object storage; the bytes never pass
//! through this service. The record exists before the bytes do, since it is
//! created when an upload URL is issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for a single stored file.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct FileRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// Display filename as declared by the uploader.
    pub filename: String,

    /// Opaque key under which the bytes live in the bucket. Generated
    /// server-side, unique, never client-supplied.
    pub storage_key: String,

    /// Declared MIME type; pinned into the presigned upload URL.
    pub content_type: String,

    /// Declared size in bytes.
    pub size_bytes: i64,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Public records are readable by any authenticated user.
    pub is_public: bool,

    /// Owning user. Immutable after creation.
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /files/upload`.
#[derive(Debug, Deserialize)]
pub struct FileCreate {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial metadata update. Ownership and storage key are not updatable.
#[derive(Debug, Default, Deserialize)]
pub struct FileUpdate {
    pub filename: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

/// Response for `POST /files/upload`.
#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    /// Presigned URL the client PUTs the bytes to.
    pub upload_url: String,
    pub file_id: Uuid,
}

/// Response for `GET /files/download/{id}`.
#[derive(Debug, Serialize)]
pub struct FileDownloadResponse {
    /// Presigned URL the client GETs the bytes from.
    pub download_url: String,
    pub filename: String,
    pub content_type: String,
}
