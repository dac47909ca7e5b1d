//! HTTP protocol layer with Axum routes.
//!
//! This crate provides:
//! - the file routes (`PUT`/`GET`/`DELETE` and copy)
//! - parameter validation ahead of every backend call
//! - the mapping of backend outcomes onto status codes

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use fileserver_core::storage::StorageBackend;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backend chosen at startup.
    pub storage: Arc<dyn StorageBackend>,
}

impl AppState {
    /// Create state around a storage backend.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }
}

/// Creates the main application router.
///
/// Uploads larger than `max_upload_bytes` are rejected with 400.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
