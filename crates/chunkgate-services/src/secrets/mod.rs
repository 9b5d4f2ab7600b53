//! Secret store abstraction
//!
//! Per-file encryption keys live in a key-value secret store. The trait is kept to
//! the two operations the key manager needs plus a reachability check.

pub mod memory;
pub mod vault;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemorySecretStore;
pub use vault::VaultClient;

/// Secret store operation errors
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Secret store error: {0}")]
    Provider(String),
}

/// Result type for secret store operations
pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Write `value` under entry `name` at `path`
    async fn write_key(&self, path: &str, name: &str, value: &str) -> SecretStoreResult<()>;

    /// Read entry `name` at `path`
    async fn read_key(&self, path: &str, name: &str) -> SecretStoreResult<String>;

    /// Verify that the store is reachable
    async fn check(&self) -> SecretStoreResult<()>;
}
