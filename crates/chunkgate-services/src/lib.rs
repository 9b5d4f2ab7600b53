//! Chunkgate Services Library
//!
//! The upload protocol core: per-file encryption keys over a secret store, the
//! metadata service client, the per-chunk upload coordinator and the status
//! aggregator. Every external system sits behind a trait with a production adapter
//! and an in-memory one.

pub mod coordinator;
pub mod encryption;
pub mod factory;
pub mod files;
pub mod secrets;
pub mod status;

// Re-export commonly used types
pub use coordinator::{storage_error, UploadCoordinator};
pub use encryption::{random_key, EncryptionKeyManager, KeyGenerator};
pub use factory::{create_files_api, create_key_manager, create_secret_store};
pub use files::{FileState, FilesApi, FilesApiClient, InMemoryFilesApi};
pub use secrets::{
    InMemorySecretStore, SecretStore, SecretStoreError, SecretStoreResult, VaultClient,
};
pub use status::StatusAggregator;
