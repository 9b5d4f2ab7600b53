//! Status reconciliation across the metadata service, storage and the secret store

use crate::encryption::EncryptionKeyManager;
use crate::files::FilesApi;
use chunkgate_core::{CallerContext, ProbeResult, Status, UploadError, UploadResult};
use chunkgate_storage::ObjectStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct StatusAggregator {
    storage: Arc<dyn ObjectStorage>,
    files: Arc<dyn FilesApi>,
    keys: Option<EncryptionKeyManager>,
}

impl StatusAggregator {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        files: Arc<dyn FilesApi>,
        keys: Option<EncryptionKeyManager>,
    ) -> Self {
        Self {
            storage,
            files,
            keys,
        }
    }

    /// Composite status of `path`.
    ///
    /// Only a missing metadata record fails the call; storage and key probes run
    /// concurrently and each degrades its own field.
    pub async fn status(&self, ctx: &CallerContext, path: &str) -> UploadResult<Status> {
        let metadata = self.files.get_file(ctx, path).await.map_err(|e| {
            tracing::debug!(error = %e, path = %path, "Status requested for unregistered file");
            UploadError::FilesApiNotFound(path.to_string())
        })?;

        let (file_content, encryption_key) =
            tokio::join!(self.probe_content(path), self.probe_key(path));

        Ok(Status {
            metadata,
            file_content,
            encryption_key,
        })
    }

    async fn probe_content(&self, path: &str) -> ProbeResult {
        match self.storage.head(path).await {
            Ok(head) if head.content_length > 0 => ProbeResult::valid(),
            Ok(_) => ProbeResult::invalid("stored object is empty"),
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Storage probe failed");
                ProbeResult::invalid(e.to_string())
            }
        }
    }

    async fn probe_key(&self, path: &str) -> Option<ProbeResult> {
        let keys = self.keys.as_ref()?;
        Some(match keys.read_key(path).await {
            Ok(_) => ProbeResult::valid(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Encryption key probe failed");
                ProbeResult::invalid(e.to_string())
            }
        })
    }
}
