//! Per-file encryption key lifecycle against a secret store

use crate::secrets::SecretStore;
use chunkgate_core::constants::VAULT_KEY_NAME;
use chunkgate_core::{EncryptionKey, UploadError, UploadResult};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::sync::Arc;

/// Length of generated keys in bytes (AES-128)
pub const KEY_LEN: usize = 16;

/// Source of fresh keys. Tests substitute fixed values.
pub type KeyGenerator = Arc<dyn Fn() -> Result<EncryptionKey, String> + Send + Sync>;

/// Random key from the operating system's CSPRNG
pub fn random_key() -> Result<EncryptionKey, String> {
    let mut bytes = vec![0u8; KEY_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| e.to_string())?;
    Ok(EncryptionKey::new(bytes))
}

/// Creates and reads per-file keys stored hex-encoded at `{prefix}/{file path}`.
///
/// The manager does not track which files already have a key; callers decide when
/// a key is generated.
#[derive(Clone)]
pub struct EncryptionKeyManager {
    store: Arc<dyn SecretStore>,
    prefix: String,
    generator: KeyGenerator,
}

impl EncryptionKeyManager {
    pub fn new(store: Arc<dyn SecretStore>, prefix: impl Into<String>) -> Self {
        Self::with_generator(store, prefix, Arc::new(random_key))
    }

    pub fn with_generator(
        store: Arc<dyn SecretStore>,
        prefix: impl Into<String>,
        generator: KeyGenerator,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            generator,
        }
    }

    /// Secret store path holding the key for `file_path`
    pub fn key_path(&self, file_path: &str) -> String {
        format!("{}/{}", self.prefix, file_path)
    }

    /// Generate a new key for `file_path` and persist it
    pub async fn generate_key(&self, file_path: &str) -> UploadResult<EncryptionKey> {
        let key = (self.generator)().map_err(UploadError::KeyGeneration)?;

        self.store
            .write_key(&self.key_path(file_path), VAULT_KEY_NAME, &key.to_hex())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %file_path, "Failed to store encryption key");
                UploadError::VaultWrite(e.to_string())
            })?;

        tracing::debug!(path = %file_path, "Encryption key generated");
        Ok(key)
    }

    /// Read the key previously generated for `file_path`
    pub async fn read_key(&self, file_path: &str) -> UploadResult<EncryptionKey> {
        let encoded = self
            .store
            .read_key(&self.key_path(file_path), VAULT_KEY_NAME)
            .await
            .map_err(|e| UploadError::VaultRead(e.to_string()))?;

        EncryptionKey::from_hex(&encoded)
    }

    /// Verify that the secret store is reachable
    pub async fn check(&self) -> UploadResult<()> {
        self.store
            .check()
            .await
            .map_err(|e| UploadError::VaultRead(e.to_string()))
    }
}
