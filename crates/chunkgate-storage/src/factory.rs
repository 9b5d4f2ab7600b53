use crate::memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{ObjectStorage, StorageBackend, StorageError, StorageResult};
use chunkgate_core::Config;
use std::sync::Arc;

/// Create an object storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            if config.upload_bucket_name.trim().is_empty() {
                return Err(StorageError::ConfigError(
                    "UPLOAD_BUCKET_NAME not configured".to_string(),
                ));
            }
            let storage = S3Storage::new(
                config.upload_bucket_name.clone(),
                config.aws_region.clone(),
                config.s3_endpoint.clone(),
            )
            .await?;
            tracing::info!(
                bucket = %config.upload_bucket_name,
                region = %config.aws_region,
                endpoint = ?config.s3_endpoint,
                "S3 storage initialized"
            );
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage; uploads are lost on restart");
            Ok(Arc::new(MemoryStorage::new(config.upload_bucket_name.clone())))
        }
    }
}
