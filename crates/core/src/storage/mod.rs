//! Storage backends for stored files.
//!
//! Every backend implements the same capability set behind
//! [`StorageBackend`]; the variant is chosen once at startup from
//! configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        StorageBackend                            │
//! │          put / get / copy / delete / delete_all                  │
//! ├────────────────────────────────┬────────────────────────────────┤
//! │ LocalStorage (OpenDAL fs)      │ ObjectStorage<C>               │
//! │ {root}/{id}/{filename}         │ {partition}/{id}/{filename}    │
//! │ get -> Retrieval::File         │ get -> Retrieval::Redirect     │
//! │                                │   C = S3ObjectClient (aws-sdk) │
//! └────────────────────────────────┴────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
pub mod key;
mod local;
mod object_store;
mod s3;

use std::sync::Arc;

pub use backend::{PresignedUrl, Retrieval, StorageBackend};
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use local::LocalStorage;
pub use object_store::{ObjectStoreClient, ObjectStorage};
pub use s3::S3ObjectClient;

/// Builds the backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the provider cannot be initialized.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match &config.provider {
        StorageProvider::LocalFs { root } => Ok(Arc::new(LocalStorage::new(
            root,
            config.prevent_cleanup,
        )?)),
        StorageProvider::S3 { .. } => {
            let client = S3ObjectClient::from_provider(&config.provider)?;
            Ok(Arc::new(ObjectStorage::new(
                client,
                config.presign_download_ttl(),
            )))
        }
    }
}
