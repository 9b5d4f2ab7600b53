//! Upload coordination
//!
//! Each call handles one chunk and is stateless across calls: whether a file is new
//! is decided by the chunk number alone, registration lives in the metadata service
//! and the key lives in the secret store. The order is always
//! register → key → store → complete, so a failed registration never writes bytes.

use crate::encryption::EncryptionKeyManager;
use crate::files::FilesApi;
use bytes::Bytes;
use chunkgate_core::constants::MAX_CHUNKS;
use chunkgate_core::{
    normalize_etag, CallerContext, CompletionDigest, EncryptionKey, FileMetadata,
    ResumableChunk, UploadCompletion, UploadError, UploadResult,
};
use chunkgate_storage::{ObjectStorage, StorageError, UploadOutcome};
use std::sync::Arc;

/// Convert a storage failure into the protocol error surfaced to callers
pub fn storage_error(err: StorageError) -> UploadError {
    match err {
        StorageError::ChunkTooSmall { .. } => UploadError::ChunkTooSmall,
        other => UploadError::Upload(other.to_string()),
    }
}

/// Drives one chunk through key handling, storage and completion
#[derive(Clone)]
pub struct UploadCoordinator {
    storage: Arc<dyn ObjectStorage>,
    files: Arc<dyn FilesApi>,
    /// `None` when encryption is disabled for the deployment
    keys: Option<EncryptionKeyManager>,
    digest: CompletionDigest,
}

impl UploadCoordinator {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        files: Arc<dyn FilesApi>,
        keys: Option<EncryptionKeyManager>,
        digest: CompletionDigest,
    ) -> Self {
        Self {
            storage,
            files,
            keys,
            digest,
        }
    }

    pub fn encryption_enabled(&self) -> bool {
        self.keys.is_some()
    }

    /// Store one chunk of `metadata.path`.
    ///
    /// Errors returned as `Err` mean nothing was committed to storage by this call,
    /// except for a first chunk whose registration succeeded. Once storage reports the
    /// object complete the result is always one of the completed variants, even if the
    /// metadata service could not be notified.
    pub async fn upload_file(
        &self,
        ctx: &CallerContext,
        metadata: &FileMetadata,
        chunk: &ResumableChunk,
        payload: Bytes,
    ) -> UploadResult<UploadCompletion> {
        validate_position(chunk)?;
        let path = metadata.path.as_str();
        let start = std::time::Instant::now();

        // A final chunk resent after storage already assembled the object only needs
        // the completion call retried. Uploading it again would open a new upload.
        if !chunk.is_first() && chunk.is_last() {
            if let Ok(head) = self.storage.head(path).await {
                tracing::warn!(
                    path = %path,
                    total_chunks = chunk.total_chunks,
                    "Final chunk resent for an assembled object, retrying completion"
                );
                let etag = head
                    .etag
                    .map(|etag| normalize_etag(&etag))
                    .ok_or_else(|| missing_etag(path));
                return Ok(self.complete(ctx, path, chunk, etag, start).await);
            }
        }

        // 1. Registration and key lifecycle
        let key = if chunk.is_first() {
            self.files.register_file(ctx, metadata).await?;
            tracing::info!(path = %path, total_chunks = chunk.total_chunks, "File registered");
            self.generate_key(path).await?
        } else {
            self.read_key(path).await?
        };

        // 2. Store the part
        let size = payload.len();
        let outcome = self
            .storage
            .upload_part(path, chunk, payload, key.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    path = %path,
                    chunk = chunk.current_chunk,
                    total_chunks = chunk.total_chunks,
                    size_bytes = size,
                    "Failed to store chunk"
                );
                storage_error(e)
            })?;

        if !outcome.all_parts_uploaded {
            tracing::debug!(
                path = %path,
                chunk = chunk.current_chunk,
                total_chunks = chunk.total_chunks,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Chunk stored"
            );
            return Ok(UploadCompletion::Continuing);
        }

        // 3. Completion
        let etag = self.completion_etag(path, &outcome).await;
        Ok(self.complete(ctx, path, chunk, etag, start).await)
    }

    /// Notify the metadata service that the object at `path` is assembled
    async fn complete(
        &self,
        ctx: &CallerContext,
        path: &str,
        chunk: &ResumableChunk,
        etag: UploadResult<String>,
        start: std::time::Instant,
    ) -> UploadCompletion {
        let etag = match etag {
            Ok(etag) => etag,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path,
                    "Could not determine digest of completed upload"
                );
                return UploadCompletion::CompletedWithNotificationFailure(e);
            }
        };

        match self.files.mark_file_uploaded(ctx, path, &etag).await {
            Ok(()) => {
                tracing::info!(
                    path = %path,
                    etag = %etag,
                    total_chunks = chunk.total_chunks,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload completed"
                );
                UploadCompletion::Completed
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path,
                    etag = %etag,
                    "Upload stored but files API was not updated"
                );
                UploadCompletion::CompletedWithNotificationFailure(e)
            }
        }
    }

    async fn generate_key(&self, path: &str) -> UploadResult<Option<EncryptionKey>> {
        match &self.keys {
            Some(keys) => keys.generate_key(path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn read_key(&self, path: &str) -> UploadResult<Option<EncryptionKey>> {
        match &self.keys {
            Some(keys) => keys.read_key(path).await.map(Some).inspect_err(|e| {
                tracing::error!(error = %e, path = %path, "Failed to read encryption key")
            }),
            None => Ok(None),
        }
    }

    async fn completion_etag(&self, path: &str, outcome: &UploadOutcome) -> UploadResult<String> {
        match self.digest {
            CompletionDigest::Part => Ok(normalize_etag(&outcome.etag)),
            CompletionDigest::Head => {
                let head = self.storage.head(path).await.map_err(storage_error)?;
                head.etag
                    .map(|etag| normalize_etag(&etag))
                    .ok_or_else(|| missing_etag(path))
            }
        }
    }
}

fn missing_etag(path: &str) -> UploadError {
    UploadError::Upload(format!("no ETag for {}", path))
}

fn validate_position(chunk: &ResumableChunk) -> UploadResult<()> {
    if chunk.current_chunk == 0 || chunk.total_chunks == 0 {
        return Err(UploadError::InvalidChunk(format!(
            "chunk {} of {}: chunk numbers start at 1",
            chunk.current_chunk, chunk.total_chunks
        )));
    }
    if chunk.total_chunks > MAX_CHUNKS {
        return Err(UploadError::InvalidChunk(format!(
            "total of {} chunks exceeds the limit of {}",
            chunk.total_chunks, MAX_CHUNKS
        )));
    }
    if chunk.current_chunk > chunk.total_chunks {
        return Err(UploadError::InvalidChunk(format!(
            "chunk {} is beyond total {}",
            chunk.current_chunk, chunk.total_chunks
        )));
    }
    Ok(())
}
