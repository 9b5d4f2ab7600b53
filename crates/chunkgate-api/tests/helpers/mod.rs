//! Test helpers: build AppState and router over in-memory backends.
//!
//! Run from workspace root: `cargo test -p chunkgate-api`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chunkgate_api::setup::routes;
use chunkgate_api::AppState;
use chunkgate_core::{
    CallerContext, Config, FileMetadata, FilesApiBackend, SecretStoreBackend, StorageBackend,
    UploadError, UploadResult,
};
use chunkgate_services::{
    EncryptionKeyManager, FilesApi, InMemoryFilesApi, InMemorySecretStore,
};
use chunkgate_storage::MemoryStorage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_PATH: &str = "datasets/cpih/data.csv";

/// Test application: server plus handles on the in-memory backends
pub struct TestApp {
    pub server: TestServer,
    pub storage: MemoryStorage,
    pub files: Arc<InMemoryFilesApi>,
    pub secrets: Arc<InMemorySecretStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config(encryption_disabled: bool) -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        secret_store_backend: SecretStoreBackend::Memory,
        files_api_backend: FilesApiBackend::Memory,
        upload_bucket_name: "testing".to_string(),
        encryption_disabled,
        ..Config::default()
    }
}

/// Metadata service wrapper that can delay calls, fail completions and report itself down
pub struct ScriptedFilesApi {
    pub inner: Arc<InMemoryFilesApi>,
    pub delay: Duration,
    pub failed_marks: AtomicUsize,
    pub down: bool,
}

impl ScriptedFilesApi {
    pub fn new(inner: Arc<InMemoryFilesApi>) -> Self {
        Self {
            inner,
            delay: Duration::ZERO,
            failed_marks: AtomicUsize::new(0),
            down: false,
        }
    }

    /// Fail the next `count` completion calls with a connection error
    pub fn failing_marks(self, count: usize) -> Self {
        self.failed_marks.store(count, Ordering::SeqCst);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.down = true;
        self
    }
}

#[async_trait]
impl FilesApi for ScriptedFilesApi {
    async fn register_file(
        &self,
        ctx: &CallerContext,
        metadata: &FileMetadata,
    ) -> UploadResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.register_file(ctx, metadata).await
    }

    async fn mark_file_uploaded(
        &self,
        ctx: &CallerContext,
        path: &str,
        etag: &str,
    ) -> UploadResult<()> {
        let failing = self
            .failed_marks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(UploadError::Connection("connection refused".to_string()));
        }
        self.inner.mark_file_uploaded(ctx, path, etag).await
    }

    async fn get_file(&self, ctx: &CallerContext, path: &str) -> UploadResult<FileMetadata> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_file(ctx, path).await
    }

    async fn check(&self) -> UploadResult<()> {
        if self.down {
            return Err(UploadError::Connection("connection refused".to_string()));
        }
        Ok(())
    }
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    setup_test_app_with_files(config, |files| files)
}

/// Build the app with the in-memory metadata service wrapped by `wrap`
pub fn setup_test_app_with_files<F>(config: Config, wrap: F) -> TestApp
where
    F: FnOnce(Arc<InMemoryFilesApi>) -> Arc<dyn FilesApi>,
{
    let storage = MemoryStorage::new(config.upload_bucket_name.clone());
    let files = Arc::new(InMemoryFilesApi::new());
    let secrets = Arc::new(InMemorySecretStore::new());
    let keys = config
        .encryption_enabled()
        .then(|| EncryptionKeyManager::new(secrets.clone(), config.vault_path.clone()));

    let state = Arc::new(AppState::new(
        config,
        Arc::new(storage.clone()),
        wrap(files.clone()),
        keys,
    ));
    let server = TestServer::new(routes::setup_routes(state)).unwrap();

    TestApp {
        server,
        storage,
        files,
        secrets,
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config(false))
}

/// Upload form for chunk `current` of `total`, carrying `payload`
pub fn chunk_form(
    path: &str,
    current: u32,
    total: u32,
    total_size: usize,
    payload: Vec<u8>,
) -> MultipartForm {
    let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
    MultipartForm::new()
        .add_text("path", path)
        .add_text("isPublishable", "false")
        .add_text("collectionId", "col-1")
        .add_text("title", "CPIH")
        .add_text("resumableTotalSize", total_size)
        .add_text("resumableType", "text/csv")
        .add_text("licence", "OGL v3")
        .add_text("licenceUrl", "http://licence.example")
        .add_text("resumableFilename", file_name.clone())
        .add_text("resumableChunkNumber", current)
        .add_text("resumableTotalChunks", total)
        .add_part(
            "file",
            Part::bytes(payload).file_name(file_name).mime_type("text/csv"),
        )
}
