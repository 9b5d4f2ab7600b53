//! In-process object storage.
//!
//! Mirrors S3 multipart semantics closely enough for tests and local runs: parts are
//! keyed by number, an upload completes once the backend holds `total_chunks` parts,
//! and completed objects carry a quoted ETag.

use crate::cipher::encrypt_part;
use crate::traits::{
    check_chunk_size, ObjectHead, ObjectStorage, StorageError, StorageResult, UploadOutcome,
};
use async_trait::async_trait;
use bytes::Bytes;
use chunkgate_core::{EncryptionKey, ResumableChunk, StorageBackend};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct PendingUpload {
    parts: BTreeMap<u32, Bytes>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
}

#[derive(Debug, Default)]
struct Inner {
    pending: HashMap<String, PendingUpload>,
    objects: HashMap<String, StoredObject>,
}

/// In-memory storage implementation
#[derive(Clone, Default)]
pub struct MemoryStorage {
    bucket: String,
    inner: Arc<RwLock<Inner>>,
}

fn digest(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("\"{}\"", hex::encode(&hash[..16]))
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Raw bytes of a completed object, as stored (encrypted parts stay encrypted)
    pub fn object_bytes(&self, path: &str) -> Option<Bytes> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.objects.get(path).map(|o| o.data.clone())
    }

    /// Number of parts received for an upload that has not completed yet
    pub fn pending_parts(&self, path: &str) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.pending.get(path).map(|u| u.parts.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload_part(
        &self,
        path: &str,
        chunk: &ResumableChunk,
        payload: Bytes,
        key: Option<&EncryptionKey>,
    ) -> StorageResult<UploadOutcome> {
        check_chunk_size(chunk, payload.len())?;

        let body = match key {
            Some(key) => Bytes::from(encrypt_part(key, chunk.current_chunk, &payload)?),
            None => payload,
        };
        let part_etag = digest(&body);

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let upload = inner.pending.entry(path.to_string()).or_default();
        upload.parts.insert(chunk.current_chunk, body);

        if upload.parts.len() < chunk.total_chunks as usize {
            return Ok(UploadOutcome {
                all_parts_uploaded: false,
                etag: part_etag,
            });
        }

        let upload = inner.pending.remove(path).unwrap_or_default();
        let mut assembled = Vec::new();
        for part in upload.parts.values() {
            assembled.extend_from_slice(part);
        }
        let etag = format!(
            "\"{}-{}\"",
            digest(&assembled).trim_matches('"'),
            upload.parts.len()
        );
        inner.objects.insert(
            path.to_string(),
            StoredObject {
                data: Bytes::from(assembled),
                etag: etag.clone(),
            },
        );

        tracing::debug!(
            bucket = %self.bucket,
            key = %path,
            parts = upload.parts.len(),
            "In-memory multipart upload completed"
        );

        Ok(UploadOutcome {
            all_parts_uploaded: true,
            etag,
        })
    }

    async fn head(&self, path: &str) -> StorageResult<ObjectHead> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .objects
            .get(path)
            .map(|o| ObjectHead {
                content_length: o.data.len() as u64,
                etag: Some(o.etag.clone()),
            })
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn object_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket, path)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
