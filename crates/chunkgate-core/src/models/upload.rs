use crate::error::UploadError;

/// Position of one chunk inside a resumable upload.
///
/// `current_chunk` is 1-based; chunk 1 is the only trigger for registration and
/// key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumableChunk {
    pub file_name: String,
    pub declared_type: String,
    pub current_chunk: u32,
    pub total_chunks: u32,
}

impl ResumableChunk {
    pub fn is_first(&self) -> bool {
        self.current_chunk == 1
    }

    pub fn is_last(&self) -> bool {
        self.current_chunk == self.total_chunks
    }
}

/// Result of handing one chunk to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCompletion {
    /// Chunk stored, more are expected
    Continuing,
    /// Object assembled and the metadata service notified
    Completed,
    /// Object assembled in storage but the metadata service was not updated
    CompletedWithNotificationFailure(UploadError),
}

impl UploadCompletion {
    /// Whether the object is complete in storage, regardless of notification
    pub fn all_parts_uploaded(&self) -> bool {
        !matches!(self, UploadCompletion::Continuing)
    }
}

/// Per-request caller identity forwarded to the metadata service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Raw `Authorization` header value of the incoming request
    pub authorization: Option<String>,
}

impl CallerContext {
    pub fn with_authorization(value: impl Into<String>) -> Self {
        Self {
            authorization: Some(value.into()),
        }
    }
}

/// Strip the quoted form S3-style backends wrap around ETags
pub fn normalize_etag(raw: &str) -> String {
    raw.trim_matches('"').to_string()
}
