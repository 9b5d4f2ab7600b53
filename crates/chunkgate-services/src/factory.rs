//! Backend construction from configuration

use crate::encryption::EncryptionKeyManager;
use crate::files::{FilesApi, FilesApiClient, InMemoryFilesApi};
use crate::secrets::{InMemorySecretStore, SecretStore, VaultClient};
use anyhow::Context;
use chunkgate_core::{Config, FilesApiBackend, SecretStoreBackend};
use std::sync::Arc;

/// Create the secret store selected by configuration
pub fn create_secret_store(config: &Config) -> anyhow::Result<Arc<dyn SecretStore>> {
    match config.secret_store_backend {
        SecretStoreBackend::Vault => {
            let client = VaultClient::new(
                config.vault_addr.clone(),
                config.vault_token.clone(),
                config.outbound_timeout(),
            )
            .context("Failed to create Vault client")?;
            tracing::info!(
                addr = %config.vault_addr,
                path = %config.vault_path,
                "Vault secret store initialized"
            );
            Ok(Arc::new(client))
        }
        SecretStoreBackend::Memory => {
            tracing::warn!("Using in-memory secret store; encryption keys are lost on restart");
            Ok(Arc::new(InMemorySecretStore::new()))
        }
    }
}

/// Key manager for the deployment, or `None` when encryption is disabled
pub fn create_key_manager(config: &Config) -> anyhow::Result<Option<EncryptionKeyManager>> {
    if !config.encryption_enabled() {
        tracing::info!("Encryption disabled; chunks are stored unencrypted");
        return Ok(None);
    }
    let store = create_secret_store(config)?;
    Ok(Some(EncryptionKeyManager::new(store, config.vault_path.clone())))
}

/// Create the metadata service client selected by configuration
pub fn create_files_api(config: &Config) -> anyhow::Result<Arc<dyn FilesApi>> {
    match config.files_api_backend {
        FilesApiBackend::Http => {
            let client = FilesApiClient::new(
                config.files_api_url.clone(),
                config.service_auth_token.clone(),
                config.outbound_timeout(),
            )
            .context("Failed to create files API client")?;
            tracing::info!(url = %config.files_api_url, "Files API client initialized");
            Ok(Arc::new(client))
        }
        FilesApiBackend::Memory => {
            tracing::warn!("Using in-memory files API; registrations are lost on restart");
            Ok(Arc::new(InMemoryFilesApi::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_disabled_has_no_key_manager() {
        let config = Config {
            encryption_disabled: true,
            ..Config::default()
        };
        assert!(create_key_manager(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_backends() {
        let config = Config {
            secret_store_backend: SecretStoreBackend::Memory,
            files_api_backend: FilesApiBackend::Memory,
            ..Config::default()
        };
        let keys = create_key_manager(&config).unwrap().unwrap();
        assert_eq!(keys.key_path("a.csv"), "secret/shared/psk/a.csv");

        let files = create_files_api(&config).unwrap();
        files.check().await.unwrap();
    }

    #[test]
    fn test_http_backends_build_clients() {
        let config = Config::default();
        assert!(create_secret_store(&config).is_ok());
        assert!(create_files_api(&config).is_ok());
    }
}
