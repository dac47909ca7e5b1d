//! File server
//!
//! Main entry point for the file server gateway.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileserver_api::{AppState, create_router};
use fileserver_core::storage::{self, StorageConfig};
use fileserver_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileserver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        backend = config.storage.backend_name(),
        "Configuration loaded"
    );

    let storage_config = StorageConfig::from(config.storage);
    let backend = storage::from_config(&storage_config).context("failed to initialize storage")?;
    info!(backend = backend.name(), "Storage backend ready");

    let app = create_router(AppState::new(backend), config.server.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
