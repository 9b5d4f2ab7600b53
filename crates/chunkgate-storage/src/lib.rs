//! Chunkgate Storage Library
//!
//! Object storage adapters for resumable uploads. Each file is stored as one
//! multipart upload whose part numbers are the resumable chunk numbers; the backend
//! reports when every part has arrived and the object is assembled.
//!
//! Storage keys are the file paths registered with the metadata service, unchanged.

pub mod cipher;
pub mod factory;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use chunkgate_core::StorageBackend;
pub use factory::create_storage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    check_chunk_size, ObjectHead, ObjectStorage, StorageError, StorageResult, UploadOutcome,
};
