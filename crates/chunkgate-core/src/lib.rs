//! Chunkgate Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by the storage adapters, the upload services, the HTTP API and the SDK.

pub mod backend_types;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use backend_types::{CompletionDigest, FilesApiBackend, SecretStoreBackend, StorageBackend};
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, UploadError, UploadResult};
pub use models::{
    normalize_etag, CallerContext, ContentItem, EncryptionKey, FileMetadata, JsonError,
    JsonErrors, ProbeResult, ResumableChunk, Status, UploadCompletion,
};
