//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Run an async check with timeout; returns "healthy", "timeout", or "unhealthy: {error}".
async fn run_check<F, E>(timeout: Duration, f: F) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub checks: BTreeMap<&'static str, String>,
}

/// Check every backend the upload path depends on
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthCheckResponse>) {
    let timeout = state.config.healthcheck_timeout();
    let mut checks = BTreeMap::new();

    let (storage, files, secrets) = tokio::join!(
        run_check(timeout, state.storage.check()),
        run_check(timeout, state.files.check()),
        async {
            match &state.keys {
                Some(keys) => Some(run_check(timeout, keys.check()).await),
                None => None,
            }
        }
    );

    checks.insert("storage", storage);
    checks.insert("files_api", files);
    if let Some(secrets) = secrets {
        checks.insert("secret_store", secrets);
    }

    let healthy = checks.values().all(|c| c == "healthy");
    if !healthy {
        tracing::warn!(checks = ?checks, "Health check failed");
    }

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status = if healthy { "healthy" } else { "unhealthy" };

    (
        status_code,
        Json(HealthCheckResponse {
            status: status.to_string(),
            checks,
        }),
    )
}
