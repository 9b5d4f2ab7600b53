//! HTTP client for the metadata service

use super::FilesApi;
use async_trait::async_trait;
use chunkgate_core::constants::UPLOADED_STATE;
use chunkgate_core::{CallerContext, FileMetadata, JsonErrors, UploadError, UploadResult};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

const DUPLICATE_FILE_CODE: &str = "DuplicateFileError";
const VALIDATION_CODE: &str = "ValidationError";

#[derive(Debug, Serialize)]
struct UploadComplete<'a> {
    state: &'a str,
    etag: &'a str,
}

/// Metadata service client over reqwest
#[derive(Clone)]
pub struct FilesApiClient {
    client: reqwest::Client,
    base_url: String,
    service_token: String,
}

impl FilesApiClient {
    pub fn new(
        base_url: impl Into<String>,
        service_token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_token: service_token.into(),
        })
    }

    fn file_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Forward the caller's credentials, falling back to the service token
    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        ctx: &CallerContext,
    ) -> reqwest::RequestBuilder {
        match ctx.authorization.as_deref() {
            Some(value) if !value.is_empty() => {
                request.header(reqwest::header::AUTHORIZATION, value)
            }
            _ if !self.service_token.is_empty() => request.bearer_auth(&self.service_token),
            _ => request,
        }
    }

    fn connection_error(&self, e: reqwest::Error) -> UploadError {
        tracing::error!(error = %e, url = %self.base_url, "Failed to connect to files API");
        UploadError::Connection(e.to_string())
    }

    /// Map a 400 body's first error code
    async fn bad_request_error(response: reqwest::Response) -> UploadError {
        let errors = match response.json::<JsonErrors>().await {
            Ok(errors) => errors,
            Err(e) => return UploadError::Unknown(format!("unreadable error body: {}", e)),
        };

        match errors.first_code() {
            Some(DUPLICATE_FILE_CODE) => UploadError::DuplicateFile,
            Some(VALIDATION_CODE) => UploadError::Validation(errors.to_string()),
            Some(other) => UploadError::Unknown(format!("files API error code {}", other)),
            None => UploadError::Unknown("files API returned 400 without errors".to_string()),
        }
    }
}

#[async_trait]
impl FilesApi for FilesApiClient {
    async fn register_file(
        &self,
        ctx: &CallerContext,
        metadata: &FileMetadata,
    ) -> UploadResult<()> {
        tracing::info!(
            path = %metadata.path,
            url = %self.base_url,
            "Registering file with files API"
        );

        let request = self
            .client
            .post(format!("{}/files", self.base_url))
            .json(metadata);
        let response = self
            .authorize(request, ctx)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let err = match status {
            StatusCode::BAD_REQUEST => Self::bad_request_error(response).await,
            StatusCode::FORBIDDEN => UploadError::Unauthorised,
            StatusCode::INTERNAL_SERVER_ERROR => UploadError::Server,
            other => UploadError::Unknown(format!("files API returned status {}", other)),
        };

        tracing::warn!(
            path = %metadata.path,
            status = status.as_u16(),
            error = %err,
            "Files API rejected registration"
        );
        Err(err)
    }

    async fn mark_file_uploaded(
        &self,
        ctx: &CallerContext,
        path: &str,
        etag: &str,
    ) -> UploadResult<()> {
        let request = self.client.patch(self.file_url(path)).json(&UploadComplete {
            state: UPLOADED_STATE,
            etag,
        });
        let response = self
            .authorize(request, ctx)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(path = %path, etag = %etag, "File marked as uploaded");
            return Ok(());
        }

        let err = match status {
            StatusCode::NOT_FOUND => UploadError::FileNotFound(path.to_string()),
            StatusCode::CONFLICT => UploadError::FileStateConflict(path.to_string()),
            StatusCode::FORBIDDEN => UploadError::Unauthorised,
            StatusCode::INTERNAL_SERVER_ERROR => UploadError::Server,
            other => UploadError::Unknown(format!("files API returned status {}", other)),
        };

        tracing::warn!(
            path = %path,
            status = status.as_u16(),
            error = %err,
            "Files API rejected upload completion"
        );
        Err(err)
    }

    async fn get_file(&self, ctx: &CallerContext, path: &str) -> UploadResult<FileMetadata> {
        let not_found = || UploadError::FileNotFound(path.to_string());

        let response = self
            .authorize(self.client.get(self.file_url(path)), ctx)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, path = %path, "Files API lookup failed");
                not_found()
            })?;

        if !response.status().is_success() {
            tracing::debug!(
                path = %path,
                status = response.status().as_u16(),
                "File not found in files API"
            );
            return Err(not_found());
        }

        response.json::<FileMetadata>().await.map_err(|e| {
            tracing::debug!(error = %e, path = %path, "Unreadable files API record");
            not_found()
        })
    }

    async fn check(&self) -> UploadResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| UploadError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(UploadError::Unknown(format!(
                "files API health returned status {}",
                response.status()
            )))
        }
    }
}
