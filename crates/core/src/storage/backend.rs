//! Backend capability trait and retrieval modes.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fileserver_shared::{ExpireTag, FileId, Filename};

use super::error::StorageError;

/// Time-limited signed URL granting direct read access to one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// How the content of a file is handed back to a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Absolute path of the file; the caller streams its bytes.
    File(PathBuf),
    /// Signed URL the caller redirects to.
    Redirect(PresignedUrl),
}

/// Capability set shared by all storage backends.
///
/// Parameters are validated before they reach a backend, so implementations
/// only deal with medium failures.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Stores `content` under `(id, filename)`, replacing any previous content.
    async fn put(
        &self,
        id: &FileId,
        filename: &Filename,
        expire: ExpireTag,
        content: Bytes,
    ) -> Result<(), StorageError>;

    /// Locates a stored file.
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored under `(id, filename)`.
    async fn get(&self, id: &FileId, filename: &Filename) -> Result<Retrieval, StorageError>;

    /// Copies a file from one id to another, tagging the copy with `expire`.
    async fn copy(
        &self,
        source: &FileId,
        destination: &FileId,
        filename: &Filename,
        expire: ExpireTag,
    ) -> Result<(), StorageError>;

    /// Deletes one file.
    async fn delete(&self, id: &FileId, filename: &Filename) -> Result<(), StorageError>;

    /// Deletes every file stored under `id`.
    async fn delete_all(&self, id: &FileId) -> Result<(), StorageError>;
}
