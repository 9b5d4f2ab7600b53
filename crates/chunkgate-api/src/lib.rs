//! Chunkgate API Library
//!
//! HTTP handlers, error rendering and application setup for the upload service.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use error::{HttpAppError, RequestError};
pub use state::AppState;
