//! HashiCorp Vault KV (v1) client

use super::{SecretStore, SecretStoreError, SecretStoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct VaultReadResponse {
    data: HashMap<String, serde_json::Value>,
}

/// Vault client speaking the KV v1 HTTP API
pub struct VaultClient {
    addr: String,
    token: String,
    client: reqwest::Client,
}

impl VaultClient {
    pub fn new(
        addr: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> SecretStoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SecretStoreError::Provider(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            addr: addr.into(),
            token: token.into(),
            client,
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.addr.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.build_url(path))
            .header("X-Vault-Token", self.token.as_str())
    }

    async fn error_for_status(
        response: reqwest::Response,
        path: &str,
    ) -> SecretStoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SecretStoreError::NotFound(path.to_string()));
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(SecretStoreError::Provider(format!(
            "Vault request failed with status {}: {}",
            status, error_text
        )))
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn write_key(&self, path: &str, name: &str, value: &str) -> SecretStoreResult<()> {
        let body = serde_json::json!({ name: value });

        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| SecretStoreError::Network(format!("Request failed: {}", e)))?;

        Self::error_for_status(response, path).await?;
        Ok(())
    }

    async fn read_key(&self, path: &str, name: &str) -> SecretStoreResult<String> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| SecretStoreError::Network(format!("Request failed: {}", e)))?;

        let response: VaultReadResponse = Self::error_for_status(response, path)
            .await?
            .json()
            .await
            .map_err(|e| SecretStoreError::Provider(format!("Failed to parse response: {}", e)))?;

        match response.data.get(name) {
            Some(serde_json::Value::String(value)) => Ok(value.clone()),
            Some(other) => Err(SecretStoreError::Provider(format!(
                "Entry {} at {} is not a string: {}",
                name, path, other
            ))),
            None => Err(SecretStoreError::NotFound(format!("{}#{}", path, name))),
        }
    }

    async fn check(&self) -> SecretStoreResult<()> {
        let response = self
            .client
            .get(format!("{}/v1/sys/health", self.addr.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| SecretStoreError::Network(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SecretStoreError::Provider(format!(
                "Vault health returned status {}",
                response.status()
            )))
        }
    }
}
