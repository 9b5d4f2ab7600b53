//! Chunk upload handler

use crate::error::{HttpAppError, RequestError};
use crate::state::AppState;
use crate::validation::UploadForm;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use bytes::Bytes;
use chunkgate_core::constants::FILE_FORM_FIELD;
use chunkgate_core::{CallerContext, UploadCompletion, UploadError};
use std::collections::HashMap;
use std::sync::Arc;

/// Caller identity forwarded to the metadata service
pub fn caller_context(headers: &HeaderMap) -> CallerContext {
    CallerContext {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    }
}

/// Text fields and the file part of one multipart upload request
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<Bytes>), RequestError> {
    let mut fields = HashMap::new();
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RequestError::ParsingForm(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if name == FILE_FORM_FIELD {
            if file.is_some() {
                return Err(RequestError::FileForm(
                    "multiple file parts; send exactly one field named 'file'".to_string(),
                ));
            }
            let data = field
                .bytes()
                .await
                .map_err(|e| RequestError::FileForm(e.to_string()))?;
            file = Some(data);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| RequestError::ParsingForm(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, file))
}

/// Accept one chunk of a resumable upload.
///
/// 200 when more chunks are expected, 201 when this chunk completed the file and
/// the metadata service was notified. A stored file whose completion call failed
/// is reported as `NotificationFailed` (409 for a state conflict).
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StatusCode, HttpAppError> {
    let multipart = multipart.map_err(|e| RequestError::ParsingForm(e.body_text()))?;
    let (fields, file) = read_multipart(multipart).await?;

    let form = UploadForm::from_fields(&fields)?;
    form.check()?;
    let payload =
        file.ok_or_else(|| RequestError::FileForm("no file part named 'file'".to_string()))?;

    let (metadata, chunk) = form.into_parts();
    let ctx = caller_context(&headers);

    tracing::debug!(
        path = %metadata.path,
        chunk = chunk.current_chunk,
        total_chunks = chunk.total_chunks,
        size_bytes = payload.len(),
        "Chunk received"
    );

    let outcome = tokio::time::timeout(
        state.config.request_timeout(),
        state.coordinator.upload_file(&ctx, &metadata, &chunk, payload),
    )
    .await
    .map_err(|_| state.error(UploadError::Timeout))?
    .map_err(|e| state.error(e))?;

    match outcome {
        UploadCompletion::Continuing => Ok(StatusCode::OK),
        UploadCompletion::Completed => Ok(StatusCode::CREATED),
        UploadCompletion::CompletedWithNotificationFailure(e) => Err(state.notification_error(e)),
    }
}
