use crate::cipher::encrypt_part;
use crate::traits::{
    check_chunk_size, ObjectHead, ObjectStorage, StorageError, StorageResult, UploadOutcome,
};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chunkgate_core::constants::MIN_CHUNK_SIZE;
use chunkgate_core::{EncryptionKey, ResumableChunk, StorageBackend};

/// Error code S3 returns when completing an upload whose non-final parts are under 5 MiB
const ENTITY_TOO_SMALL: &str = "EntityTooSmall";

/// S3 multipart storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

/// Path-style URL of `key`: `https://s3-{region}.amazonaws.com/{bucket}/{key}`, or
/// `{endpoint}/{bucket}/{key}` for S3-compatible providers
pub fn path_style_url(region: &str, bucket: &str, endpoint: Option<&str>, key: &str) -> String {
    let key = key.trim_start_matches('/');
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://s3-{}.amazonaws.com/{}/{}", region, bucket, key),
    }
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region
    /// * `endpoint_url` - Optional custom endpoint URL
    ///   (e.g. "http://localhost:4566" for localstack)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(region.clone()));

        // Retries are the caller's decision; every request is attempted once.
        let retry_config = RetryConfig::standard().with_max_attempts(1);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(config.region().cloned())
                .retry_config(retry_config);
            if let Some(provider) = config.credentials_provider() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            // Path-style addressing is required by localstack and MinIO
            s3_config_builder = s3_config_builder.force_path_style(true);

            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&config)
        };

        Ok(S3Storage {
            client,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Upload ID of the in-progress multipart upload for `key`, creating one if none exists.
    ///
    /// When several uploads exist for the key the earliest one wins, so racing chunks
    /// converge on the same upload.
    async fn find_or_create_upload(&self, key: &str, content_type: &str) -> StorageResult<String> {
        let listed = self
            .client
            .list_multipart_uploads()
            .bucket(&self.bucket)
            .prefix(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to list multipart uploads"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let existing = listed
            .uploads()
            .iter()
            .filter(|u| u.key() == Some(key))
            .min_by_key(|u| u.initiated().map(|t| (t.secs(), t.subsec_nanos())))
            .and_then(|u| u.upload_id())
            .map(String::from);

        if let Some(upload_id) = existing {
            return Ok(upload_id);
        }

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to create multipart upload"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let upload_id = created.upload_id().ok_or_else(|| {
            StorageError::UploadFailed("No upload ID returned from S3".to_string())
        })?;

        tracing::info!(bucket = %self.bucket, key = %key, "Multipart upload created");

        Ok(upload_id.to_string())
    }

    /// Every part S3 holds for `upload_id`, following pagination
    async fn list_parts(&self, key: &str, upload_id: &str) -> StorageResult<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_parts()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id);
            if let Some(ref m) = marker {
                request = request.part_number_marker(m);
            }

            let page = request.send().await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to list uploaded parts"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

            for part in page.parts() {
                parts.push(
                    CompletedPart::builder()
                        .set_part_number(part.part_number())
                        .set_e_tag(part.e_tag().map(String::from))
                        .build(),
                );
            }

            match (page.is_truncated(), page.next_part_number_marker()) {
                (Some(true), Some(next)) => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(parts)
    }

    async fn complete_upload(
        &self,
        key: &str,
        upload_id: &str,
        mut parts: Vec<CompletedPart>,
    ) -> StorageResult<String> {
        parts.sort_by_key(|p| p.part_number());
        let part_count = parts.len();

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                if e.code() == Some(ENTITY_TOO_SMALL) {
                    tracing::warn!(
                        bucket = %self.bucket,
                        key = %key,
                        "S3 rejected completion: part below minimum size"
                    );
                    return StorageError::ChunkTooSmall {
                        size: 0,
                        minimum: MIN_CHUNK_SIZE,
                    };
                }
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to complete multipart upload"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            parts = part_count,
            "S3 multipart upload completed"
        );

        Ok(completed.e_tag().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload_part(
        &self,
        path: &str,
        chunk: &ResumableChunk,
        payload: Bytes,
        key: Option<&EncryptionKey>,
    ) -> StorageResult<UploadOutcome> {
        check_chunk_size(chunk, payload.len())?;
        let part_number = i32::try_from(chunk.current_chunk).map_err(|_| {
            StorageError::UploadFailed(format!("part number {} out of range", chunk.current_chunk))
        })?;

        let start = std::time::Instant::now();
        let upload_id = self
            .find_or_create_upload(path, &chunk.declared_type)
            .await?;

        let body = match key {
            Some(key) => Bytes::from(encrypt_part(key, chunk.current_chunk, &payload)?),
            None => payload,
        };
        let size = body.len();

        let uploaded = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(&upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %path,
                    part_number = chunk.current_chunk,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Failed to upload part"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let part_etag = uploaded
            .e_tag()
            .ok_or_else(|| {
                StorageError::UploadFailed(format!(
                    "No ETag returned for part {}",
                    chunk.current_chunk
                ))
            })?
            .to_string();

        let parts = self.list_parts(path, &upload_id).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            part_number = chunk.current_chunk,
            parts_received = parts.len(),
            total_chunks = chunk.total_chunks,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 part upload successful"
        );

        if parts.len() < chunk.total_chunks as usize {
            return Ok(UploadOutcome {
                all_parts_uploaded: false,
                etag: part_etag,
            });
        }

        let etag = self.complete_upload(path, &upload_id, parts).await?;
        Ok(UploadOutcome {
            all_parts_uploaded: true,
            etag,
        })
    }

    async fn head(&self, path: &str) -> StorageResult<ObjectHead> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(output) => Ok(ObjectHead {
                content_length: output.content_length().unwrap_or(0).max(0) as u64,
                etag: output.e_tag().map(String::from),
            }),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Err(StorageError::NotFound(path.to_string())),
                    _ => Err(StorageError::BackendError(e.to_string())),
                },
                _ => Err(StorageError::BackendError(e.to_string())),
            },
        }
    }

    async fn check(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }

    fn object_url(&self, path: &str) -> String {
        path_style_url(
            &self.region,
            &self.bucket,
            self.endpoint_url.as_deref(),
            path,
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_style_url_for_aws() {
        assert_eq!(
            path_style_url("eu-west-1", "testing", None, "a/b.csv"),
            "https://s3-eu-west-1.amazonaws.com/testing/a/b.csv"
        );
    }

    #[test]
    fn test_path_style_url_for_custom_endpoint() {
        assert_eq!(
            path_style_url("eu-west-1", "testing", Some("http://localstack:4566/"), "/a/b.csv"),
            "http://localstack:4566/testing/a/b.csv"
        );
    }
}
