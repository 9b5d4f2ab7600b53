//! Object storage abstraction trait
//!
//! This module defines the ObjectStorage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use chunkgate_core::constants::MIN_CHUNK_SIZE;
use chunkgate_core::{EncryptionKey, ResumableChunk, StorageBackend};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A non-final part was smaller than the backend's multipart minimum
    #[error("Chunk too small: {size} bytes (minimum {minimum})")]
    ChunkTooSmall { size: usize, minimum: usize },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of storing one part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Reported by the backend once every part of the upload is present and assembled
    pub all_parts_uploaded: bool,
    /// Digest of the stored part, or of the whole object when `all_parts_uploaded`
    pub etag: String,
}

/// Existence/size probe of a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub content_length: u64,
    pub etag: Option<String>,
}

/// Object storage abstraction trait
///
/// Backends assemble an object from independently uploaded, numbered parts. The
/// part number is the chunk's `current_chunk`, so resending a chunk overwrites the
/// same part instead of appending.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store one chunk as a part of the object at `path`.
    ///
    /// When `key` is given the payload is encrypted before it leaves the process.
    async fn upload_part(
        &self,
        path: &str,
        chunk: &ResumableChunk,
        payload: Bytes,
        key: Option<&EncryptionKey>,
    ) -> StorageResult<UploadOutcome>;

    /// Probe the assembled object at `path`
    async fn head(&self, path: &str) -> StorageResult<ObjectHead>;

    /// Verify that the backend (bucket) is reachable
    async fn check(&self) -> StorageResult<()>;

    /// Address of the object at `path`
    fn object_url(&self, path: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject non-final parts below the multipart minimum before any bytes are sent.
/// The final chunk (including a single-chunk file) may be of any size.
pub fn check_chunk_size(chunk: &ResumableChunk, size: usize) -> StorageResult<()> {
    if !chunk.is_last() && size < MIN_CHUNK_SIZE {
        return Err(StorageError::ChunkTooSmall {
            size,
            minimum: MIN_CHUNK_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(current: u32, total: u32) -> ResumableChunk {
        ResumableChunk {
            file_name: "data.csv".to_string(),
            declared_type: "text/csv".to_string(),
            current_chunk: current,
            total_chunks: total,
        }
    }

    #[test]
    fn test_non_final_chunk_below_minimum_is_rejected() {
        match check_chunk_size(&chunk(1, 2), MIN_CHUNK_SIZE - 1) {
            Err(StorageError::ChunkTooSmall { size, minimum }) => {
                assert_eq!(size, MIN_CHUNK_SIZE - 1);
                assert_eq!(minimum, MIN_CHUNK_SIZE);
            }
            other => panic!("Expected ChunkTooSmall variant, got {:?}", other),
        }
    }

    #[test]
    fn test_non_final_chunk_at_minimum_is_accepted() {
        assert!(check_chunk_size(&chunk(1, 2), MIN_CHUNK_SIZE).is_ok());
    }

    #[test]
    fn test_final_chunk_of_any_size_is_accepted() {
        assert!(check_chunk_size(&chunk(2, 2), 1).is_ok());
        assert!(check_chunk_size(&chunk(1, 1), 10).is_ok());
        assert!(check_chunk_size(&chunk(1, 1), 0).is_ok());
    }
}
