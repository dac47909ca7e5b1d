//! File routes.
//!
//! | Route                                  | Success     | Not found | Invalid | Failure |
//! |----------------------------------------|-------------|-----------|---------|---------|
//! | `PUT /{id}/{filename}`                 | 200         | -         | 400     | 400     |
//! | `GET /{id}/{filename}`                 | 200 / 302   | 404       | 404     | 404     |
//! | `PUT /copy/{source}/{dest}/{filename}` | 200         | 404       | 400     | 400     |
//! | `DELETE /{id}/{filename}`              | 200         | 200       | 200     | 200     |
//! | `DELETE /{id}`                         | 200         | 200       | 400     | 200     |

use std::path::Path as FsPath;

use axum::{
    Router,
    body::Body,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, put},
};
use bytes::Bytes;
use fileserver_core::storage::{PresignedUrl, Retrieval, StorageError};
use fileserver_shared::{ExpireTag, FileId, Filename, ParameterError};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace, warn};

use crate::{AppState, error::ApiError};

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/{filename}",
            put(put_file).get(get_file).delete(delete_file),
        )
        .route("/copy/{source}/{destination}/{filename}", put(copy_file))
        .route("/{id}", delete(delete_all))
}

/// Query parameters of the write routes.
#[derive(Debug, Default, Deserialize)]
pub struct ExpiresQuery {
    /// Expire tag name; absent or unknown means `never`.
    pub expires: Option<String>,
}

impl ExpiresQuery {
    fn tag(&self) -> ExpireTag {
        ExpireTag::from_query(self.expires.as_deref())
    }
}

fn parse_file(id: &str, filename: &str) -> Result<(FileId, Filename), ParameterError> {
    Ok((FileId::parse(id)?, Filename::parse(filename)?))
}

/// Logs a backend failure: absence at trace level, anything else as a warning.
fn log_storage_error(err: &StorageError, operation: &str) {
    if err.is_not_found() {
        trace!(error = %err, operation, "file not present");
    } else {
        warn!(error = %err, operation, "storage operation failed");
    }
}

/// PUT `/{id}/{filename}?expires={tag}`
async fn put_file(
    State(state): State<AppState>,
    Path((id, filename)): Path<(String, String)>,
    Query(query): Query<ExpiresQuery>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError> {
    let (id, filename) = parse_file(&id, &filename)?;
    // Oversized or unreadable bodies are a rejected upload, not a separate status.
    let body = body.map_err(|rejection| ApiError::Rejected(rejection.body_text()))?;
    let expire = query.tag();
    debug!(%id, %filename, %expire, size = body.len(), "storing file");

    state
        .storage
        .put(&id, &filename, expire, body)
        .await
        .map_err(|e| {
            log_storage_error(&e, "put");
            ApiError::Rejected(e.to_string())
        })?;

    Ok(StatusCode::OK)
}

/// GET `/{id}/{filename}`
///
/// Streams the file (local backend) or redirects to a signed URL (object store).
async fn get_file(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((id, filename)) =
        path.map_err(|rejection| ApiError::NotFound(rejection.body_text()))?;
    let (id, filename) =
        parse_file(&id, &filename).map_err(|e| ApiError::NotFound(e.to_string()))?;
    debug!(%id, %filename, "retrieving file");

    let retrieval = state.storage.get(&id, &filename).await.map_err(|e| {
        log_storage_error(&e, "get");
        ApiError::NotFound(e.to_string())
    })?;

    match retrieval {
        Retrieval::File(path) => stream_file(&path, &filename).await,
        Retrieval::Redirect(presigned) => redirect(presigned),
    }
}

/// Streams a file from disk. The file handle lives in the body stream and is
/// closed when the body is dropped, whether or not it was fully sent.
async fn stream_file(path: &FsPath, filename: &Filename) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        // Deleted between the existence check and the open.
        trace!(error = %e, path = %path.display(), "file vanished before streaming");
        ApiError::NotFound(filename.to_string())
    })?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::NotFound(e.to_string()))?
        .len();

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_DISPOSITION, content_disposition(filename)),
        (header::CONTENT_LENGTH, HeaderValue::from(length)),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

fn content_disposition(filename: &Filename) -> HeaderValue {
    let escaped = filename.as_str().replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn redirect(presigned: PresignedUrl) -> Result<Response, ApiError> {
    let location = HeaderValue::try_from(presigned.url)
        .map_err(|e| ApiError::NotFound(format!("unusable signed url: {e}")))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// PUT `/copy/{source}/{destination}/{filename}?expires={tag}`
async fn copy_file(
    State(state): State<AppState>,
    Path((source, destination, filename)): Path<(String, String, String)>,
    Query(query): Query<ExpiresQuery>,
) -> Result<StatusCode, ApiError> {
    let (source, filename) = parse_file(&source, &filename)?;
    let destination = FileId::parse(destination)?;
    let expire = query.tag();
    debug!(%source, %destination, %filename, %expire, "copying file");

    state
        .storage
        .copy(&source, &destination, &filename, expire)
        .await
        .map_err(|e| {
            log_storage_error(&e, "copy");
            if e.is_not_found() {
                ApiError::NotFound(e.to_string())
            } else {
                ApiError::Rejected(e.to_string())
            }
        })?;

    Ok(StatusCode::OK)
}

/// DELETE `/{id}/{filename}`
///
/// Always answers 200: deleting is idempotent for callers.
async fn delete_file(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> StatusCode {
    let Path((id, filename)) = match path {
        Ok(path) => path,
        Err(rejection) => {
            trace!(error = %rejection, "ignoring delete with undecodable path");
            return StatusCode::OK;
        }
    };
    match parse_file(&id, &filename) {
        Ok((id, filename)) => {
            debug!(%id, %filename, "deleting file");
            if let Err(e) = state.storage.delete(&id, &filename).await {
                log_storage_error(&e, "delete");
            }
        }
        Err(e) => trace!(error = %e, "ignoring delete with invalid parameters"),
    }
    StatusCode::OK
}

/// DELETE `/{id}`
async fn delete_all(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_all_for_id(&state, id).await
}

/// Shared by every route whose single segment is taken as an id.
pub(crate) async fn delete_all_for_id(
    state: &AppState,
    id: String,
) -> Result<StatusCode, ApiError> {
    let id = FileId::parse(id)?;
    debug!(%id, "deleting all files");

    if let Err(e) = state.storage.delete_all(&id).await {
        log_storage_error(&e, "delete_all");
    }
    Ok(StatusCode::OK)
}
