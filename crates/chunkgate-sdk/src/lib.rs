//! Client SDK for the chunkgate upload service.
//!
//! [`UploadClient::upload`] splits a byte stream into fixed-size chunks and sends
//! each one as a multipart request to `/upload-new`, stopping at the first
//! rejected chunk. Retrying is left to the caller.

pub mod error;
pub mod upload;

pub use error::{SdkError, SdkResult};

use chunkgate_core::constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNKS};
use chunkgate_core::{JsonErrors, Status};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Header carrying a publishing user's session token
pub const FLORENCE_TOKEN_HEADER: &str = "X-Florence-Token";

/// Headers added to every request; empty values are skipped
#[derive(Clone, Debug, Default)]
pub struct Headers {
    /// Sent as `Authorization: Bearer {token}`
    pub service_auth_token: String,
    pub florence_token: Option<String>,
}

impl Headers {
    pub fn with_service_token(token: impl Into<String>) -> Self {
        Self {
            service_auth_token: token.into(),
            florence_token: None,
        }
    }

    fn apply(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if !self.service_auth_token.is_empty() {
            request = request.bearer_auth(&self.service_auth_token);
        }
        if let Some(token) = self.florence_token.as_deref().filter(|t| !t.is_empty()) {
            request = request.header(FLORENCE_TOKEN_HEADER, token);
        }
        request
    }
}

/// How files are split
#[derive(Clone, Copy, Debug)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub max_chunks: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: MAX_CHUNKS,
        }
    }
}

impl ChunkingConfig {
    /// Largest file that fits in `max_chunks` chunks
    pub fn max_file_size(&self) -> u64 {
        self.chunk_size as u64 * u64::from(self.max_chunks)
    }

    /// Number of chunks needed for `size` bytes
    pub fn total_chunks(&self, size: u64) -> u32 {
        size.div_ceil(self.chunk_size as u64) as u32
    }
}

/// Health document returned by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub checks: BTreeMap<String, String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// HTTP client for the upload service
#[derive(Clone, Debug)]
pub struct UploadClient {
    client: Client,
    base_url: String,
    headers: Headers,
    chunking: ChunkingConfig,
}

impl UploadClient {
    pub fn new(base_url: impl Into<String>, headers: Headers) -> SdkResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers,
            chunking: ChunkingConfig::default(),
        })
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chunking(&self) -> ChunkingConfig {
        self.chunking
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload status of a registered file
    pub async fn status(&self, path: &str) -> SdkResult<Status> {
        let url = self.build_url(&format!("/status/{}", path.trim_start_matches('/')));
        let response = self.headers.apply(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Service health; an unhealthy service still returns its check report
    pub async fn health(&self) -> SdkResult<HealthResponse> {
        let url = self.build_url("/health");
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Ok(response.json().await?);
        }
        Err(api_error(response).await)
    }
}

/// Build an [`SdkError::Api`] from a rejected response, keeping any error list it carries
async fn api_error(response: reqwest::Response) -> SdkError {
    let status = response.status().as_u16();
    let errors = match response.text().await {
        Ok(body) => serde_json::from_str::<JsonErrors>(&body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, status = status, "Error response carried no error list");
            JsonErrors::default()
        }),
        Err(e) => {
            tracing::debug!(error = %e, status = status, "Failed to read error response");
            JsonErrors::default()
        }
    };
    SdkError::Api { status, errors }
}
