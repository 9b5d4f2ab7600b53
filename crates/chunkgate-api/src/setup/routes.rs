//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const UPLOAD_ROUTE: &str = "/upload-new";

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_chunk_bytes;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(UPLOAD_ROUTE, post(handlers::upload::upload_chunk))
        .route("/upload/{*path}", get(handlers::s3_url::get_s3_url))
        .route("/status/{*path}", get(handlers::status::get_status))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
