use super::FilesApi;
use async_trait::async_trait;
use chunkgate_core::{CallerContext, FileMetadata, UploadError, UploadResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Lifecycle state of a registered file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Created,
    Uploaded,
}

#[derive(Debug, Clone)]
struct FileRecord {
    metadata: FileMetadata,
    state: FileState,
    etag: Option<String>,
}

/// Metadata service held in process memory.
///
/// Enforces the same rules as the real service: paths are unique, and only a
/// file in the `Created` state can be marked uploaded.
#[derive(Debug, Default)]
pub struct InMemoryFilesApi {
    files: RwLock<HashMap<String, FileRecord>>,
    register_calls: AtomicUsize,
    mark_calls: AtomicUsize,
}

impl InMemoryFilesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registration attempts, successful or not
    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// Number of completion attempts, successful or not
    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }

    pub fn state(&self, path: &str) -> Option<FileState> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).map(|r| r.state)
    }

    pub fn etag(&self, path: &str) -> Option<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).and_then(|r| r.etag.clone())
    }
}

#[async_trait]
impl FilesApi for InMemoryFilesApi {
    async fn register_file(
        &self,
        _ctx: &CallerContext,
        metadata: &FileMetadata,
    ) -> UploadResult<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);

        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        if files.contains_key(&metadata.path) {
            return Err(UploadError::DuplicateFile);
        }
        files.insert(
            metadata.path.clone(),
            FileRecord {
                metadata: metadata.clone(),
                state: FileState::Created,
                etag: None,
            },
        );
        Ok(())
    }

    async fn mark_file_uploaded(
        &self,
        _ctx: &CallerContext,
        path: &str,
        etag: &str,
    ) -> UploadResult<()> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);

        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let record = files
            .get_mut(path)
            .ok_or_else(|| UploadError::FileNotFound(path.to_string()))?;
        if record.state != FileState::Created {
            return Err(UploadError::FileStateConflict(path.to_string()));
        }
        record.state = FileState::Uploaded;
        record.etag = Some(etag.to_string());
        Ok(())
    }

    async fn get_file(&self, _ctx: &CallerContext, path: &str) -> UploadResult<FileMetadata> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(path)
            .map(|r| r.metadata.clone())
            .ok_or_else(|| UploadError::FileNotFound(path.to_string()))
    }

    async fn check(&self) -> UploadResult<()> {
        Ok(())
    }
}
