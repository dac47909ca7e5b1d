//! [`ObjectStoreClient`] for S3-compatible stores (AWS S3, MinIO, R2).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectAttributes, ObjectIdentifier, TaggingDirective};
use bytes::Bytes;
use tracing::warn;

use super::config::StorageProvider;
use super::error::StorageError;
use super::object_store::ObjectStoreClient;

/// Most keys a single `DeleteObjects` request accepts.
const MAX_DELETE_BATCH: usize = 1000;

/// S3 client bound to one bucket.
pub struct S3ObjectClient {
    client: Client,
    bucket: String,
}

impl S3ObjectClient {
    /// Create from an existing SDK client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create from provider settings.
    ///
    /// Credentials missing from the settings are read from
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-S3 provider or when no
    /// credentials are available.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let StorageProvider::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            force_path_style,
        } = provider
        else {
            return Err(StorageError::configuration(format!(
                "{} is not an S3 provider",
                provider.name()
            )));
        };

        let access_key = credential(access_key_id.as_deref(), "AWS_ACCESS_KEY_ID")?;
        let secret_key = credential(secret_access_key.as_deref(), "AWS_SECRET_ACCESS_KEY")?;
        let credentials = Credentials::new(access_key, secret_key, None, None, "fileserver");

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(region.clone()))
            .credentials_provider(credentials)
            .force_path_style(*force_path_style)
            .behavior_version(BehaviorVersion::latest());
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self::new(Client::from_conf(builder.build()), bucket))
    }

    /// `CopySource` header value: bucket and key, each key segment URL-encoded.
    fn copy_source(&self, key: &str) -> String {
        let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
        format!("{}/{}", self.bucket, encoded.join("/"))
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectClient {
    async fn put_object(
        &self,
        key: &str,
        tagging: &str,
        content: Bytes,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .tagging(tagging)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| sdk_error("PUT", key, &e))?;
        Ok(())
    }

    async fn check_exists(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .get_object_attributes()
            .bucket(&self.bucket)
            .key(key)
            .object_attributes(ObjectAttributes::Checksum)
            .send()
            .await
            .map_err(|e| sdk_error("GET attributes", key, &e))?;
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        content_disposition: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::configuration(format!("invalid presign ttl: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(content_disposition)
            .presigned(presigning)
            .await
            .map_err(|e| sdk_error("presign", key, &e))?;

        Ok(request.uri().to_string())
    }

    async fn copy_object(
        &self,
        source_key: &str,
        destination_key: &str,
        tagging: &str,
    ) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(self.copy_source(source_key))
            .key(destination_key)
            .tagging(tagging)
            .tagging_directive(TaggingDirective::Replace)
            .send()
            .await
            .map_err(|e| sdk_error("COPY", source_key, &e))?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| sdk_error("LIST", prefix, &e))?;

            keys.extend(
                response
                    .contents
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|object| object.key),
            );

            match response.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn delete_objects(&self, keys: Vec<String>) -> Result<(), StorageError> {
        // S3 rejects a Delete without objects, and there is nothing to do.
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::operation(e.to_string()))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| StorageError::operation(e.to_string()))?;

            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| {
                    StorageError::operation(format!("S3 DELETE failed: {}", DisplayErrorContext(&e)))
                })?;

            if let Some(failure) = output.errors().first() {
                warn!(
                    key = failure.key().unwrap_or_default(),
                    code = failure.code().unwrap_or_default(),
                    "object delete rejected"
                );
                return Err(StorageError::operation(format!(
                    "S3 DELETE rejected {}: {}",
                    failure.key().unwrap_or_default(),
                    failure.message().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}

fn credential(configured: Option<&str>, env_var: &str) -> Result<String, StorageError> {
    match configured {
        Some(value) => Ok(value.to_string()),
        None => std::env::var(env_var)
            .map_err(|_| StorageError::configuration(format!("{env_var} is not set"))),
    }
}

fn sdk_error<E>(operation: &str, key: &str, err: &SdkError<E>) -> StorageError
where
    E: std::error::Error + 'static,
{
    if is_not_found(err) {
        StorageError::not_found(key)
    } else {
        StorageError::operation(format!("S3 {operation} failed: {}", DisplayErrorContext(err)))
    }
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    matches!(err, SdkError::ServiceError(e) if e.raw().status().as_u16() == 404)
}
