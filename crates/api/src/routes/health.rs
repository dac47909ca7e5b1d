//! Health check endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use crate::{AppState, error::ApiError, routes::files};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `DELETE /health` shares its shape with `DELETE /{id}`, so it answers like
/// a delete-all with an invalid id.
async fn delete_health(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    files::delete_all_for_id(&state, "health".to_string()).await
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check).delete(delete_health))
}
