//! Object-store backend.
//!
//! Files live under `{partition}/{id}/{filename}` keys in a single bucket and
//! carry an `expires` tag that bucket lifecycle rules act on. Reads are served
//! by redirecting to a presigned URL.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use fileserver_shared::{ExpireTag, FileId, Filename};
use tracing::debug;

use super::backend::{PresignedUrl, Retrieval, StorageBackend};
use super::error::StorageError;
use super::key;

/// Primitive operations the object-store backend needs from its medium.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Uploads an object with the given tag set (`k=v&k2=v2`).
    async fn put_object(&self, key: &str, tagging: &str, content: Bytes)
    -> Result<(), StorageError>;

    /// Fails with [`StorageError::NotFound`] if the object does not exist.
    async fn check_exists(&self, key: &str) -> Result<(), StorageError>;

    /// Signs a GET request for the object.
    async fn presign_get(
        &self,
        key: &str,
        content_disposition: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Copies an object, replacing the tag set of the copy.
    async fn copy_object(
        &self,
        source_key: &str,
        destination_key: &str,
        tagging: &str,
    ) -> Result<(), StorageError>;

    /// Lists every key that starts with `prefix`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Deletes a batch of objects. Missing keys are not an error.
    async fn delete_objects(&self, keys: Vec<String>) -> Result<(), StorageError>;
}

/// [`StorageBackend`] on top of an [`ObjectStoreClient`].
pub struct ObjectStorage<C> {
    client: C,
    presign_ttl: Duration,
}

impl<C: ObjectStoreClient> ObjectStorage<C> {
    /// Create a backend whose download links stay valid for `presign_ttl`.
    pub fn new(client: C, presign_ttl: Duration) -> Self {
        Self {
            client,
            presign_ttl,
        }
    }
}

#[async_trait]
impl<C: ObjectStoreClient + 'static> StorageBackend for ObjectStorage<C> {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        id: &FileId,
        filename: &Filename,
        expire: ExpireTag,
        content: Bytes,
    ) -> Result<(), StorageError> {
        let key = key::key(id, filename);
        debug!(%key, expire = %expire, size = content.len(), "uploading object");
        self.client
            .put_object(&key, &expire.tagging(), content)
            .await
    }

    async fn get(&self, id: &FileId, filename: &Filename) -> Result<Retrieval, StorageError> {
        let key = key::key(id, filename);
        self.client.check_exists(&key).await?;

        let disposition = format!("attachment; filename=\"{filename}\"");
        let url = self
            .client
            .presign_get(&key, &disposition, self.presign_ttl)
            .await?;
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.presign_ttl)
                .map_err(|e| StorageError::configuration(format!("invalid presign ttl: {e}")))?;

        Ok(Retrieval::Redirect(PresignedUrl { url, expires_at }))
    }

    async fn copy(
        &self,
        source: &FileId,
        destination: &FileId,
        filename: &Filename,
        expire: ExpireTag,
    ) -> Result<(), StorageError> {
        // The store does not tell a missing source apart from other failures.
        self.client
            .copy_object(
                &key::key(source, filename),
                &key::key(destination, filename),
                &expire.tagging(),
            )
            .await
            .map_err(StorageError::into_operation)
    }

    async fn delete(&self, id: &FileId, filename: &Filename) -> Result<(), StorageError> {
        self.client
            .delete_objects(vec![key::key(id, filename)])
            .await
            .map_err(StorageError::into_operation)
    }

    async fn delete_all(&self, id: &FileId) -> Result<(), StorageError> {
        let prefix = key::prefix(id);
        let keys = self.client.list_keys(&prefix).await?;
        debug!(%prefix, count = keys.len(), "deleting objects");
        self.client
            .delete_objects(keys)
            .await
            .map_err(StorageError::into_operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";
    const PREFIXED_ID: &str = "j6ba7b8109dad11d180b400c04fd430c8";
    const FILENAME: &str = "test.gml";
    const TTL: Duration = Duration::from_secs(3600);

    fn id(value: &str) -> FileId {
        FileId::parse(value).unwrap()
    }

    fn name(value: &str) -> Filename {
        Filename::parse(value).unwrap()
    }

    #[tokio::test]
    async fn test_put_uses_partitioned_key_and_tag() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_put_object()
            .withf(|key, tagging, content| {
                key == format!("5/{ID}/{FILENAME}")
                    && tagging == "expires=short"
                    && content.as_ref() == b"AERIUS"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage
            .put(&id(ID), &name(FILENAME), ExpireTag::Short, Bytes::from("AERIUS"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_prefixed_id_lands_in_fallback_partition() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_put_object()
            .withf(|key, tagging, _| {
                key == format!("z/{PREFIXED_ID}/{FILENAME}") && tagging == "expires=never"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage
            .put(
                &id(PREFIXED_ID),
                &name(FILENAME),
                ExpireTag::Never,
                Bytes::new(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_presigns_existing_object() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_check_exists()
            .withf(|key| key == format!("5/{ID}/{FILENAME}"))
            .times(1)
            .returning(|_| Ok(()));
        client
            .expect_presign_get()
            .withf(|key, disposition, ttl| {
                key == format!("5/{ID}/{FILENAME}")
                    && disposition == "attachment; filename=\"test.gml\""
                    && *ttl == TTL
            })
            .times(1)
            .returning(|_, _, _| Ok("https://bucket.example/signed".to_string()));

        let storage = ObjectStorage::new(client, TTL);
        let before = Utc::now();
        let retrieval = storage.get(&id(ID), &name(FILENAME)).await.unwrap();

        let Retrieval::Redirect(presigned) = retrieval else {
            panic!("object storage should redirect");
        };
        assert_eq!(presigned.url, "https://bucket.example/signed");
        assert!(presigned.expires_at >= before + chrono::Duration::seconds(3600));
    }

    #[tokio::test]
    async fn test_get_missing_object_does_not_presign() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_check_exists()
            .returning(|key| Err(StorageError::not_found(key)));
        client.expect_presign_get().never();

        let storage = ObjectStorage::new(client, TTL);
        let err = storage.get(&id(ID), &name(FILENAME)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_copy_retags_destination() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_copy_object()
            .withf(|source, destination, tagging| {
                source == format!("5/{ID}/{FILENAME}")
                    && destination == format!("z/{PREFIXED_ID}/{FILENAME}")
                    && tagging == "expires=legal"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage
            .copy(&id(ID), &id(PREFIXED_ID), &name(FILENAME), ExpireTag::Legal)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_operation_error() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_copy_object()
            .returning(|source, _, _| Err(StorageError::not_found(source)));

        let storage = ObjectStorage::new(client, TTL);
        let err = storage
            .copy(&id(ID), &id(PREFIXED_ID), &name(FILENAME), ExpireTag::Never)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Operation(_)));
    }

    #[tokio::test]
    async fn test_delete_sends_single_key_batch() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_delete_objects()
            .with(eq(vec![format!("5/{ID}/{FILENAME}")]))
            .times(1)
            .returning(|_| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage.delete(&id(ID), &name(FILENAME)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_removes_listed_keys() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_list_keys()
            .withf(|prefix| prefix == format!("5/{ID}/"))
            .times(1)
            .returning(|prefix| Ok(vec![format!("{prefix}a.txt"), format!("{prefix}b.txt")]));
        client
            .expect_delete_objects()
            .with(eq(vec![
                format!("5/{ID}/a.txt"),
                format!("5/{ID}/b.txt"),
            ]))
            .times(1)
            .returning(|_| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage.delete_all(&id(ID)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_without_objects_still_issues_batch() {
        let mut client = MockObjectStoreClient::new();
        client.expect_list_keys().returning(|_| Ok(Vec::new()));
        client
            .expect_delete_objects()
            .with(eq(Vec::<String>::new()))
            .times(1)
            .returning(|_| Ok(()));

        let storage = ObjectStorage::new(client, TTL);
        storage.delete_all(&id(PREFIXED_ID)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_all_list_failure_propagates() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_list_keys()
            .returning(|_| Err(StorageError::operation("access denied")));
        client.expect_delete_objects().never();

        let storage = ObjectStorage::new(client, TTL);
        let err = storage.delete_all(&id(ID)).await.unwrap_err();
        assert!(matches!(err, StorageError::Operation(_)));
    }
    mod memory {
        use super::*;
        use std::collections::BTreeMap;
        use std::sync::Mutex;

        /// Bucket held in memory: key to content and tag set.
        #[derive(Default)]
        struct MemoryStore {
            objects: Mutex<BTreeMap<String, (Bytes, String)>>,
        }

        impl MemoryStore {
            fn tagging(&self, key: &str) -> Option<String> {
                self.objects.lock().unwrap().get(key).map(|(_, tag)| tag.clone())
            }

            fn keys(&self) -> Vec<String> {
                self.objects.lock().unwrap().keys().cloned().collect()
            }

            /// Reads the object a `mem://` URL points at.
            fn fetch(&self, url: &str) -> Option<Bytes> {
                let key = url.strip_prefix("mem://")?;
                self.objects.lock().unwrap().get(key).map(|(content, _)| content.clone())
            }
        }

        #[async_trait]
        impl ObjectStoreClient for MemoryStore {
            async fn put_object(
                &self,
                key: &str,
                tagging: &str,
                content: Bytes,
            ) -> Result<(), StorageError> {
                self.objects
                    .lock()
                    .unwrap()
                    .insert(key.to_string(), (content, tagging.to_string()));
                Ok(())
            }

            async fn check_exists(&self, key: &str) -> Result<(), StorageError> {
                if self.objects.lock().unwrap().contains_key(key) {
                    Ok(())
                } else {
                    Err(StorageError::not_found(key))
                }
            }

            async fn presign_get(
                &self,
                key: &str,
                _content_disposition: &str,
                _ttl: Duration,
            ) -> Result<String, StorageError> {
                Ok(format!("mem://{key}"))
            }

            async fn copy_object(
                &self,
                source_key: &str,
                destination_key: &str,
                tagging: &str,
            ) -> Result<(), StorageError> {
                let mut objects = self.objects.lock().unwrap();
                let (content, _) = objects
                    .get(source_key)
                    .cloned()
                    .ok_or_else(|| StorageError::not_found(source_key))?;
                objects.insert(destination_key.to_string(), (content, tagging.to_string()));
                Ok(())
            }

            async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
                Ok(self
                    .objects
                    .lock()
                    .unwrap()
                    .keys()
                    .filter(|key| key.starts_with(prefix))
                    .cloned()
                    .collect())
            }

            async fn delete_objects(&self, keys: Vec<String>) -> Result<(), StorageError> {
                let mut objects = self.objects.lock().unwrap();
                for key in keys {
                    objects.remove(&key);
                }
                Ok(())
            }
        }

        fn storage() -> ObjectStorage<MemoryStore> {
            ObjectStorage::new(MemoryStore::default(), TTL)
        }

        async fn read(storage: &ObjectStorage<MemoryStore>, id: &FileId) -> Option<Bytes> {
            match storage.get(id, &name(FILENAME)).await {
                Ok(Retrieval::Redirect(presigned)) => storage.client.fetch(&presigned.url),
                Ok(Retrieval::File(_)) => panic!("object store never serves local files"),
                Err(e) if e.is_not_found() => None,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        #[tokio::test]
        async fn test_put_then_get_returns_content() {
            let storage = storage();
            storage
                .put(&id(ID), &name(FILENAME), ExpireTag::Short, Bytes::from("AERIUS"))
                .await
                .unwrap();

            assert_eq!(read(&storage, &id(ID)).await, Some(Bytes::from("AERIUS")));
            assert_eq!(
                storage.client.tagging("5/550e8400-e29b-41d4-a716-446655440000/test.gml"),
                Some("expires=short".to_string())
            );
        }

        #[tokio::test]
        async fn test_put_overwrites_content_and_tag() {
            let storage = storage();
            storage
                .put(&id(ID), &name(FILENAME), ExpireTag::Short, Bytes::from("first"))
                .await
                .unwrap();
            storage
                .put(&id(ID), &name(FILENAME), ExpireTag::Never, Bytes::from("second"))
                .await
                .unwrap();

            assert_eq!(read(&storage, &id(ID)).await, Some(Bytes::from("second")));
            assert_eq!(storage.client.keys().len(), 1);
            assert_eq!(
                storage.client.tagging("5/550e8400-e29b-41d4-a716-446655440000/test.gml"),
                Some("expires=never".to_string())
            );
        }

        #[tokio::test]
        async fn test_copy_survives_deleting_source() {
            let storage = storage();
            storage
                .put(&id(ID), &name(FILENAME), ExpireTag::Short, Bytes::from("AERIUS"))
                .await
                .unwrap();

            storage
                .copy(&id(ID), &id(PREFIXED_ID), &name(FILENAME), ExpireTag::Legal)
                .await
                .unwrap();
            storage.delete(&id(ID), &name(FILENAME)).await.unwrap();

            assert_eq!(read(&storage, &id(ID)).await, None);
            assert_eq!(
                read(&storage, &id(PREFIXED_ID)).await,
                Some(Bytes::from("AERIUS"))
            );
            assert_eq!(
                storage.client.tagging("z/j6ba7b8109dad11d180b400c04fd430c8/test.gml"),
                Some("expires=legal".to_string())
            );
        }

        #[tokio::test]
        async fn test_copy_missing_source_leaves_store_untouched() {
            let storage = storage();

            let err = storage
                .copy(&id(ID), &id(PREFIXED_ID), &name(FILENAME), ExpireTag::Legal)
                .await
                .unwrap_err();

            assert!(matches!(err, StorageError::Operation(_)));
            assert!(storage.client.keys().is_empty());
        }

        #[tokio::test]
        async fn test_delete_all_only_touches_its_own_id() {
            let storage = storage();
            for file_id in [id(ID), id(PREFIXED_ID)] {
                for filename in ["a.gml", "b.pdf"] {
                    storage
                        .put(&file_id, &name(filename), ExpireTag::Never, Bytes::from("x"))
                        .await
                        .unwrap();
                }
            }

            storage.delete_all(&id(ID)).await.unwrap();

            assert_eq!(
                storage.client.keys(),
                vec![
                    "z/j6ba7b8109dad11d180b400c04fd430c8/a.gml".to_string(),
                    "z/j6ba7b8109dad11d180b400c04fd430c8/b.pdf".to_string(),
                ]
            );
        }

        #[tokio::test]
        async fn test_delete_all_on_empty_id_is_ok() {
            let storage = storage();
            storage.delete_all(&id(PREFIXED_ID)).await.unwrap();
            assert!(storage.client.keys().is_empty());
        }
    }
}
