//! Metadata service ("files API") abstraction
//!
//! The metadata service owns file registration state. The coordinator registers a
//! file on its first chunk and marks it uploaded once storage reports completion;
//! the status aggregator reads the registered record back.

pub mod client;
pub mod memory;

use async_trait::async_trait;
use chunkgate_core::{CallerContext, FileMetadata, UploadResult};

pub use client::FilesApiClient;
pub use memory::{FileState, InMemoryFilesApi};

#[async_trait]
pub trait FilesApi: Send + Sync {
    /// Register a new file. Called once per file, on its first chunk.
    async fn register_file(&self, ctx: &CallerContext, metadata: &FileMetadata)
        -> UploadResult<()>;

    /// Record that every part of `path` is stored, with the object's digest
    async fn mark_file_uploaded(&self, ctx: &CallerContext, path: &str, etag: &str)
        -> UploadResult<()>;

    /// Registered record of `path`
    async fn get_file(&self, ctx: &CallerContext, path: &str) -> UploadResult<FileMetadata>;

    /// Verify that the service is reachable
    async fn check(&self) -> UploadResult<()>;
}
