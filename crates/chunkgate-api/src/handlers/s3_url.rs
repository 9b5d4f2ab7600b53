use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ObjectUrlResponse {
    pub url: String,
}

/// Address of the stored object for `path`
pub async fn get_s3_url(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Json<ObjectUrlResponse> {
    Json(ObjectUrlResponse {
        url: state.storage.object_url(&path),
    })
}
