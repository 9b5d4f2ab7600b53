//! Configuration module
//!
//! The service is configured once at startup from environment variables (and an
//! optional `.env` file). The resulting [`Config`] is immutable and handed to every
//! component constructor.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::backend_types::{CompletionDigest, FilesApiBackend, SecretStoreBackend, StorageBackend};
use crate::constants::MIB;

const BIND_ADDR: &str = "0.0.0.0:25100";
const AWS_REGION: &str = "eu-west-1";
const UPLOAD_BUCKET_NAME: &str = "testing";
const VAULT_ADDR: &str = "http://localhost:8200";
const VAULT_PATH: &str = "secret/shared/psk";
const FILES_API_URL: &str = "http://localhost:26900";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const OUTBOUND_TIMEOUT_SECS: u64 = 30;
const MAX_CHUNK_BYTES: usize = 10 * MIB;
const GRACEFUL_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const HEALTHCHECK_TIMEOUT_SECS: u64 = 5;

/// Upload service configuration
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub environment: String,
    // Object storage
    pub storage_backend: StorageBackend,
    pub aws_region: String,
    pub upload_bucket_name: String,
    /// Custom endpoint for S3-compatible providers (localstack, MinIO)
    pub s3_endpoint: Option<String>,
    // Encryption
    pub encryption_disabled: bool,
    /// Explicit digest mode; `None` derives it from `encryption_disabled`
    pub completion_digest: Option<CompletionDigest>,
    pub secret_store_backend: SecretStoreBackend,
    pub vault_addr: String,
    pub vault_token: String,
    pub vault_path: String,
    // Metadata service
    pub files_api_backend: FilesApiBackend,
    pub files_api_url: String,
    pub service_auth_token: String,
    // Timeouts and limits
    pub request_timeout_secs: u64,
    pub outbound_timeout_secs: u64,
    pub max_chunk_bytes: usize,
    pub graceful_shutdown_timeout_secs: u64,
    pub healthcheck_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: BIND_ADDR.to_string(),
            environment: "development".to_string(),
            storage_backend: StorageBackend::S3,
            aws_region: AWS_REGION.to_string(),
            upload_bucket_name: UPLOAD_BUCKET_NAME.to_string(),
            s3_endpoint: None,
            encryption_disabled: false,
            completion_digest: None,
            secret_store_backend: SecretStoreBackend::Vault,
            vault_addr: VAULT_ADDR.to_string(),
            vault_token: String::new(),
            vault_path: VAULT_PATH.to_string(),
            files_api_backend: FilesApiBackend::Http,
            files_api_url: FILES_API_URL.to_string(),
            service_auth_token: String::new(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            outbound_timeout_secs: OUTBOUND_TIMEOUT_SECS,
            max_chunk_bytes: MAX_CHUNK_BYTES,
            graceful_shutdown_timeout_secs: GRACEFUL_SHUTDOWN_TIMEOUT_SECS,
            healthcheck_timeout_secs: HEALTHCHECK_TIMEOUT_SECS,
        }
    }
}

/// Read `name`, falling back to `default` when unset or unparsable
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `name` as a backend selector, rejecting unknown values
fn env_backend<T>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr<Err = anyhow::Error>,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e: anyhow::Error| e.context(format!("{} is invalid", name))),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let config = Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or(defaults.environment),
            storage_backend: env_backend("STORAGE_BACKEND", defaults.storage_backend)?,
            aws_region: env::var("AWS_REGION").unwrap_or(defaults.aws_region),
            upload_bucket_name: env::var("UPLOAD_BUCKET_NAME")
                .unwrap_or(defaults.upload_bucket_name),
            s3_endpoint: env::var("S3_ENDPOINT")
                .or_else(|_| env::var("LOCALSTACK_HOST"))
                .ok()
                .filter(|s| !s.is_empty()),
            encryption_disabled: env::var("ENCRYPTION_DISABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            completion_digest: match env::var("COMPLETION_DIGEST") {
                Ok(value) if !value.trim().is_empty() => Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|e: anyhow::Error| e.context("COMPLETION_DIGEST is invalid"))?,
                ),
                _ => None,
            },
            secret_store_backend: env_backend(
                "SECRET_STORE_BACKEND",
                defaults.secret_store_backend,
            )?,
            vault_addr: env::var("VAULT_ADDR").unwrap_or(defaults.vault_addr),
            vault_token: env::var("VAULT_TOKEN").unwrap_or_default(),
            vault_path: env::var("VAULT_PATH").unwrap_or(defaults.vault_path),
            files_api_backend: env_backend("FILES_API_BACKEND", defaults.files_api_backend)?,
            files_api_url: env::var("FILES_API_URL").unwrap_or(defaults.files_api_url),
            service_auth_token: env::var("SERVICE_AUTH_TOKEN").unwrap_or_default(),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS),
            outbound_timeout_secs: env_or("OUTBOUND_TIMEOUT_SECS", OUTBOUND_TIMEOUT_SECS),
            max_chunk_bytes: env_or("MAX_CHUNK_BYTES", MAX_CHUNK_BYTES),
            graceful_shutdown_timeout_secs: env_or(
                "GRACEFUL_SHUTDOWN_TIMEOUT_SECS",
                GRACEFUL_SHUTDOWN_TIMEOUT_SECS,
            ),
            healthcheck_timeout_secs: env_or("HEALTHCHECK_TIMEOUT_SECS", HEALTHCHECK_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::S3 && self.upload_bucket_name.trim().is_empty()
        {
            return Err(anyhow::anyhow!(
                "UPLOAD_BUCKET_NAME must be set when using S3 storage backend"
            ));
        }

        if self.encryption_enabled() && self.secret_store_backend == SecretStoreBackend::Vault {
            if self.vault_addr.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "VAULT_ADDR must be set when encryption is enabled"
                ));
            }
            if self.vault_path.trim_matches('/').is_empty() {
                return Err(anyhow::anyhow!(
                    "VAULT_PATH must be set when encryption is enabled"
                ));
            }
        }

        if self.files_api_backend == FilesApiBackend::Http
            && !(self.files_api_url.starts_with("http://")
                || self.files_api_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "FILES_API_URL must be an http:// or https:// URL"
            ));
        }

        if self.request_timeout_secs == 0
            || self.outbound_timeout_secs == 0
            || self.healthcheck_timeout_secs == 0
        {
            return Err(anyhow::anyhow!("timeouts must be greater than zero"));
        }

        if self.max_chunk_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_CHUNK_BYTES must be greater than zero"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn encryption_enabled(&self) -> bool {
        !self.encryption_disabled
    }

    /// Effective digest mode: explicit setting, else `Head` without encryption and `Part` with it
    pub fn completion_digest(&self) -> CompletionDigest {
        self.completion_digest.unwrap_or(if self.encryption_disabled {
            CompletionDigest::Head
        } else {
            CompletionDigest::Part
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_timeout_secs)
    }

    pub fn healthcheck_timeout(&self) -> Duration {
        Duration::from_secs(self.healthcheck_timeout_secs)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("environment", &self.environment)
            .field("storage_backend", &self.storage_backend)
            .field("aws_region", &self.aws_region)
            .field("upload_bucket_name", &self.upload_bucket_name)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("encryption_disabled", &self.encryption_disabled)
            .field("completion_digest", &self.completion_digest())
            .field("secret_store_backend", &self.secret_store_backend)
            .field("vault_addr", &self.vault_addr)
            .field("vault_token", &"[REDACTED]")
            .field("vault_path", &self.vault_path)
            .field("files_api_backend", &self.files_api_backend)
            .field("files_api_url", &self.files_api_url)
            .field("service_auth_token", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("outbound_timeout_secs", &self.outbound_timeout_secs)
            .field("max_chunk_bytes", &self.max_chunk_bytes)
            .field(
                "graceful_shutdown_timeout_secs",
                &self.graceful_shutdown_timeout_secs,
            )
            .field("healthcheck_timeout_secs", &self.healthcheck_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr, "0.0.0.0:25100");
        assert_eq!(config.aws_region, "eu-west-1");
        assert_eq!(config.vault_path, "secret/shared/psk");
    }

    #[test]
    fn test_digest_mode_follows_encryption_setting() {
        let encrypted = Config::default();
        assert_eq!(encrypted.completion_digest(), CompletionDigest::Part);

        let plain = Config {
            encryption_disabled: true,
            ..Config::default()
        };
        assert_eq!(plain.completion_digest(), CompletionDigest::Head);

        let explicit = Config {
            encryption_disabled: true,
            completion_digest: Some(CompletionDigest::Part),
            ..Config::default()
        };
        assert_eq!(explicit.completion_digest(), CompletionDigest::Part);
    }

    #[test]
    fn test_validate_rejects_empty_bucket_for_s3() {
        let config = Config {
            upload_bucket_name: "".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let memory = Config {
            upload_bucket_name: "".to_string(),
            storage_backend: StorageBackend::Memory,
            ..Config::default()
        };
        assert!(memory.validate().is_ok());
    }

    #[test]
    fn test_validate_skips_vault_when_encryption_disabled() {
        let config = Config {
            encryption_disabled: true,
            vault_addr: "".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        let enabled = Config {
            vault_addr: "".to_string(),
            ..Config::default()
        };
        assert!(enabled.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_files_api_url() {
        let config = Config {
            files_api_url: "localhost:26900".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            vault_token: "s.vault-secret".to_string(),
            service_auth_token: "service-secret".to_string(),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("vault-secret"));
        assert!(!rendered.contains("service-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_is_production() {
        let config = Config {
            environment: "Production".to_string(),
            ..Config::default()
        };
        assert!(config.is_production());
        assert!(!Config::default().is_production());
    }
}
