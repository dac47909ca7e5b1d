//! File server HTTP client.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use fileserver_shared::ExpireTag;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode, Url, redirect};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::ClientError;
use crate::file::FileServerFile;

/// Body of a retrieved file, handed to the mapping function of
/// [`FileServerClient::retrieve_file`].
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Connection settings for [`FileServerClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the file server; file paths are appended to it.
    pub base_url: Url,
    /// Deadline for every call, including reading the response body.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Default timeout of a call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a config for the file server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL with a path.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::internal(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::internal(format!(
                "base url '{base_url}' cannot have a path"
            )));
        }
        Ok(Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Set the call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the file server.
///
/// Holds two transports: one follows redirects, the other hands redirects
/// back to the caller so it can send an end user to a signed URL itself.
#[derive(Debug, Clone)]
pub struct FileServerClient {
    base_url: Url,
    client: Client,
    client_without_redirect: Client,
}

impl FileServerClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let client_without_redirect = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: config.base_url,
            client,
            client_without_redirect,
        })
    }

    /// Retrieves a file without following redirects and hands the raw
    /// response to `handler`.
    ///
    /// A 3xx response is passed on as is; no status is treated as an error.
    pub async fn retrieve_response<F, Fut, T>(
        &self,
        file: &FileServerFile,
        id: &str,
        handler: F,
    ) -> Result<T, ClientError>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = T>,
    {
        let url = self.url(&file.segments(id))?;
        let response = self.client_without_redirect.get(url).send().await?;
        Ok(handler(response).await)
    }

    /// Retrieves a file and maps its body with `mapper`.
    ///
    /// `mapper` receives the filename from the `Content-Disposition` header
    /// and the body stream. The stream is moved into the mapper: the
    /// connection is released when the mapper drops it, or lives on inside
    /// the value the mapper returns.
    ///
    /// A 404 yields [`ClientError::NotFound`]; any other failure yields
    /// [`ClientError::Internal`].
    pub async fn retrieve_file<F, Fut, T>(
        &self,
        file: &FileServerFile,
        id: &str,
        mapper: F,
    ) -> Result<T, ClientError>
    where
        F: FnOnce(Option<String>, ByteStream) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let url = self.url(&file.segments(id))?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            return Err(ClientError::internal(format!(
                "file server responded with {status}"
            )));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename);
        let stream = response.bytes_stream().map_err(ClientError::from).boxed();

        mapper(filename, stream).await
    }

    /// Stores `content` as an octet stream.
    pub async fn write(
        &self,
        file: &FileServerFile,
        id: &str,
        content: impl Into<Body>,
        expire: ExpireTag,
    ) -> Result<(), ClientError> {
        let url = self.url_with_expire(&file.segments(id), expire)?;
        let request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content);
        self.execute_write(request, "write").await
    }

    /// Stores `value` serialized as JSON.
    pub async fn write_json<T>(
        &self,
        file: &FileServerFile,
        id: &str,
        value: &T,
        expire: ExpireTag,
    ) -> Result<(), ClientError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url_with_expire(&file.segments(id), expire)?;
        let request = self.client.put(url).json(value);
        self.execute_write(request, "write_json").await
    }

    /// Copies `filename` from `source` to `destination`, tagging the copy
    /// with `expire`.
    pub async fn copy(
        &self,
        source: &str,
        destination: &str,
        filename: &str,
        expire: ExpireTag,
    ) -> Result<(), ClientError> {
        let url = self.url_with_expire(&["copy", source, destination, filename], expire)?;
        let request = self.client.request(Method::PUT, url);
        self.execute_write(request, "copy").await
    }

    /// Deletes every file stored under `id`.
    ///
    /// Nothing to delete is not an error; a server failure is.
    pub async fn delete_files_for_id(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&FileServerFile::All.segments(id))?;
        let response = self.client.delete(url).send().await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(id, %status, "deleted files");
            return Ok(());
        }
        Err(failure(response, "delete").await)
    }

    async fn execute_write(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(failure(response, operation).await)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::internal("base url cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn url_with_expire(&self, segments: &[&str], expire: ExpireTag) -> Result<Url, ClientError> {
        let mut url = self.url(segments)?;
        url.query_pairs_mut()
            .append_pair(ExpireTag::KEY, expire.as_str());
        Ok(url)
    }
}

/// Maps an unsuccessful response: 5xx is logged with the server's message
/// and surfaces as [`ClientError::Internal`], anything else as
/// [`ClientError::Rejected`].
async fn failure(response: Response, operation: &'static str) -> ClientError {
    let status = response.status();
    if status.is_server_error() {
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        error!(%url, %status, operation, body, "file server error");
        ClientError::internal(format!("file server {operation} failed with {status}"))
    } else {
        ClientError::Rejected { status }
    }
}

/// Extracts the `filename` parameter of a `Content-Disposition` value.
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (name, raw) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let raw = raw.trim();
        let filename = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            Some(quoted) => quoted.replace("\\\"", "\"").replace("\\\\", "\\"),
            None => raw.to_string(),
        };
        Some(filename)
    })
}

/// Creates a unique id: `prefix` followed by a random UUID without dashes.
///
/// A one-character prefix yields a valid prefixed id.
#[must_use]
pub fn create_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}
