//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Every error renders as the shared
//! `{"errors":[{"code","description"}]}` body with the status from
//! [`ErrorMetadata`], and is logged at the level the error declares.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chunkgate_core::{ErrorMetadata, JsonError, JsonErrors, LogLevel, UploadError};

/// Failures decoding the incoming upload request, before the coordinator runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("error parsing form: {0}")]
    ParsingForm(String),

    #[error("error getting file from form: {0}")]
    FileForm(String),

    #[error("form validation failed")]
    Validation(Vec<JsonError>),
}

impl RequestError {
    fn into_json(self) -> JsonErrors {
        match self {
            RequestError::ParsingForm(_) => JsonErrors::single("ParsingForm", self.to_string()),
            RequestError::FileForm(_) => JsonErrors::single("FileForm", self.to_string()),
            RequestError::Validation(errors) => JsonErrors { errors },
        }
    }
}

/// Code sent when the object is stored but the metadata service was not updated
pub const NOTIFICATION_FAILED_CODE: &str = "NotificationFailed";

#[derive(Debug)]
pub enum HttpAppError {
    Request(RequestError),
    Upload {
        error: UploadError,
        /// Render internal details of non-sensitive errors (off in production)
        expose_details: bool,
    },
    /// Every chunk is stored; only the completion call failed. Resending the final
    /// chunk retries that call without storing anything.
    NotificationFailed {
        error: UploadError,
        expose_details: bool,
    },
}

impl From<RequestError> for HttpAppError {
    fn from(err: RequestError) -> Self {
        HttpAppError::Request(err)
    }
}

fn log_error(error: &UploadError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn describe(error: &UploadError, expose_details: bool) -> String {
    if expose_details && !error.is_sensitive() {
        error.to_string()
    } else {
        error.client_message()
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        match self {
            HttpAppError::Request(err) => {
                tracing::debug!(error = %err, "Rejected upload request");
                (StatusCode::BAD_REQUEST, Json(err.into_json())).into_response()
            }
            HttpAppError::Upload {
                error,
                expose_details,
            } => {
                log_error(&error);

                let status = StatusCode::from_u16(error.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (
                    status,
                    Json(JsonErrors::single(
                        error.error_code(),
                        describe(&error, expose_details),
                    )),
                )
                    .into_response()
            }
            // A state conflict keeps its own 409; it already means the file left `Created`
            HttpAppError::NotificationFailed {
                error: error @ UploadError::FileStateConflict(_),
                expose_details,
            } => HttpAppError::Upload {
                error,
                expose_details,
            }
            .into_response(),
            HttpAppError::NotificationFailed {
                error,
                expose_details,
            } => {
                tracing::error!(
                    error = %error,
                    error_type = error.error_type(),
                    "Upload stored but completion was not recorded"
                );

                let description = format!(
                    "file stored but not marked uploaded ({}); resend the final chunk to retry",
                    describe(&error, expose_details)
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(JsonErrors::single(NOTIFICATION_FAILED_CODE, description)),
                )
                    .into_response()
            }
        }
    }
}
