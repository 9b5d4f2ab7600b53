use crate::error::HttpAppError;
use crate::handlers::upload::caller_context;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chunkgate_core::{Status, UploadError};
use std::sync::Arc;

/// Composite status of one file
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Status>, HttpAppError> {
    let ctx = caller_context(&headers);

    let status = tokio::time::timeout(
        state.config.request_timeout(),
        state.status.status(&ctx, &path),
    )
    .await
    .map_err(|_| state.error(UploadError::Timeout))?
    .map_err(|e| state.error(e))?;

    Ok(Json(status))
}
