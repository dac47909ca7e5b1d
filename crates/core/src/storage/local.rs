//! Local directory backend.
//!
//! Layout: `{root}/{id}/{filename}`, one directory per id. Writes go through
//! a staging directory inside the root and are renamed into place, so readers
//! never observe a partially written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use fileserver_shared::{ExpireTag, FileId, Filename};
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::backend::{Retrieval, StorageBackend};
use super::error::StorageError;

/// Staging directory for atomic writes, relative to the root.
const STAGING_DIR: &str = ".staging";

/// Stores files in a directory on the local filesystem.
pub struct LocalStorage {
    operator: Operator,
    root: PathBuf,
    prevent_cleanup: bool,
}

impl LocalStorage {
    /// Opens the storage rooted at `root`, creating the directory if needed.
    ///
    /// With `prevent_cleanup` set, deletes succeed without removing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created or the operator cannot
    /// be initialized.
    pub fn new(root: impl AsRef<Path>, prevent_cleanup: bool) -> Result<Self, StorageError> {
        let root = std::path::absolute(root.as_ref())
            .map_err(|e| StorageError::configuration(format!("invalid storage root: {e}")))?;
        let staging = root.join(STAGING_DIR);
        std::fs::create_dir_all(&staging)
            .map_err(|e| StorageError::configuration(format!("cannot create storage root: {e}")))?;

        let builder = services::Fs::default()
            .root(path_str(&root)?)
            .atomic_write_dir(path_str(&staging)?);
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self {
            operator,
            root,
            prevent_cleanup,
        })
    }

    /// Absolute root directory of the storage.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(id: &FileId) -> String {
        format!("{id}/")
    }

    fn path(id: &FileId, filename: &Filename) -> String {
        format!("{id}/{filename}")
    }

    /// Fails with `NotFound` unless a regular file exists at `path`.
    async fn ensure_file(&self, path: &str) -> Result<(), StorageError> {
        let meta = self
            .operator
            .stat(path)
            .await
            .map_err(|e| with_key(e, path))?;
        if meta.is_file() {
            Ok(())
        } else {
            Err(StorageError::not_found(path))
        }
    }

    /// Removes the id directory once its last file is gone.
    async fn remove_dir_if_empty(&self, id: &FileId) -> Result<(), StorageError> {
        let dir = Self::dir(id);
        let entries = match self.operator.list(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if entries.iter().all(|entry| entry.path() == dir) {
            self.operator.delete(&dir).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        id: &FileId,
        filename: &Filename,
        _expire: ExpireTag,
        content: Bytes,
    ) -> Result<(), StorageError> {
        // The local medium has nowhere to keep the expire tag.
        self.operator.create_dir(&Self::dir(id)).await?;
        self.operator.write(&Self::path(id, filename), content).await?;
        Ok(())
    }

    async fn get(&self, id: &FileId, filename: &Filename) -> Result<Retrieval, StorageError> {
        self.ensure_file(&Self::path(id, filename)).await?;
        Ok(Retrieval::File(
            self.root.join(id.as_str()).join(filename.as_str()),
        ))
    }

    async fn copy(
        &self,
        source: &FileId,
        destination: &FileId,
        filename: &Filename,
        _expire: ExpireTag,
    ) -> Result<(), StorageError> {
        let source_path = Self::path(source, filename);
        self.ensure_file(&source_path).await?;
        if source == destination {
            // Copying a file onto itself would truncate it.
            return Ok(());
        }

        self.operator.create_dir(&Self::dir(destination)).await?;
        self.operator
            .copy(&source_path, &Self::path(destination, filename))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &FileId, filename: &Filename) -> Result<(), StorageError> {
        if self.prevent_cleanup {
            debug!(%id, %filename, "cleanup prevented, keeping file");
            return Ok(());
        }

        self.operator.delete(&Self::path(id, filename)).await?;
        self.remove_dir_if_empty(id).await
    }

    async fn delete_all(&self, id: &FileId) -> Result<(), StorageError> {
        if self.prevent_cleanup {
            debug!(%id, "cleanup prevented, keeping files");
            return Ok(());
        }

        let dir = Self::dir(id);
        self.operator
            .stat(&dir)
            .await
            .map_err(|e| with_key(e, &dir))?;
        let entries = self.operator.list(&dir).await?;

        for entry in entries.iter().filter(|entry| entry.path() != dir) {
            self.operator.delete(entry.path()).await?;
        }
        self.operator.delete(&dir).await?;
        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str, StorageError> {
    path.to_str()
        .ok_or_else(|| StorageError::configuration("invalid path"))
}

/// Converts an OpenDAL error, naming `key` when it reports absence.
fn with_key(err: opendal::Error, key: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::not_found(key)
    } else {
        StorageError::from(err)
    }
}
