//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use chunkgate_core::Config;
use chunkgate_services::{create_files_api, create_key_manager};
use chunkgate_storage::create_storage;
use std::sync::Arc;

/// Build backends from configuration and wire them into the application state
pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize object storage")?;
    let files = create_files_api(&config)?;
    let keys = create_key_manager(&config)?;

    Ok(Arc::new(AppState::new(config, storage, files, keys)))
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config);

    tracing::info!(
        storage_backend = %config.storage_backend,
        encryption_enabled = config.encryption_enabled(),
        completion_digest = %config.completion_digest(),
        "Configuration loaded and validated successfully"
    );

    let state = build_state(config).await?;
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
