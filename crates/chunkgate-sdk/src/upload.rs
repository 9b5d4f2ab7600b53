//! Chunked upload over the `/upload-new` endpoint

use crate::{SdkError, SdkResult, UploadClient};
use chunkgate_core::constants::FILE_FORM_FIELD;
use chunkgate_core::FileMetadata;
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Position of one chunk within the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub current: u32,
    pub total: u32,
}

/// Multipart form for one chunk: the descriptive metadata, the chunk position and the bytes
fn upload_form(metadata: &FileMetadata, info: ChunkInfo, chunk: Vec<u8>) -> Form {
    let file_name = metadata.file_name().to_string();

    let mut form = Form::new()
        .text("path", metadata.path.clone())
        .text("isPublishable", metadata.is_publishable.to_string())
        .text("title", metadata.title.clone())
        .text("licence", metadata.licence.clone())
        .text("licenceUrl", metadata.licence_url.clone())
        .text("resumableType", metadata.content_type.clone())
        .text("resumableTotalSize", metadata.size_in_bytes.to_string())
        .text("resumableChunkNumber", info.current.to_string())
        .text("resumableTotalChunks", info.total.to_string())
        .text("resumableFilename", file_name.clone());

    if let Some(collection_id) = &metadata.collection_id {
        form = form.text("collectionId", collection_id.clone());
    }
    if let Some(bundle_id) = &metadata.bundle_id {
        form = form.text("bundleId", bundle_id.clone());
    }
    if let Some(item) = &metadata.content_item {
        form = form
            .text("datasetId", item.dataset_id.clone())
            .text("edition", item.edition.clone())
            .text("version", item.version.clone());
    }

    form.part(FILE_FORM_FIELD, Part::bytes(chunk).file_name(file_name))
}

impl UploadClient {
    /// Upload `content` in chunks, registering the file described by `metadata`.
    ///
    /// `metadata.size_in_bytes` decides the chunk count; `content` must hold at
    /// least that many bytes. Returns on the first chunk the server rejects.
    pub async fn upload<R>(&self, mut content: R, metadata: &FileMetadata) -> SdkResult<()>
    where
        R: AsyncRead + Unpin,
    {
        let chunking = self.chunking();
        let size = metadata.size_in_bytes;

        if size > chunking.max_file_size() {
            return Err(SdkError::FileTooLarge {
                size,
                max_bytes: chunking.max_file_size(),
            });
        }
        if size == 0 {
            return Err(SdkError::EmptyFile);
        }

        let total = chunking.total_chunks(size);
        let chunk_size = chunking.chunk_size as u64;
        let url = self.build_url("/upload-new");

        for current in 1..=total {
            let offset = u64::from(current - 1) * chunk_size;
            let len = chunk_size.min(size - offset) as usize;

            let mut chunk = vec![0u8; len];
            content.read_exact(&mut chunk).await?;

            let info = ChunkInfo { current, total };
            let form = upload_form(metadata, info, chunk);
            let request = self.headers.apply(self.client.post(&url).multipart(form));
            let response = request.send().await?;

            let status = response.status();
            if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
                tracing::debug!(
                    path = %metadata.path,
                    chunk = current,
                    total_chunks = total,
                    status = status.as_u16(),
                    "Chunk rejected"
                );
                return Err(crate::api_error(response).await);
            }

            tracing::debug!(
                path = %metadata.path,
                chunk = current,
                total_chunks = total,
                "Chunk sent"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkingConfig, Headers};
    use chunkgate_core::ContentItem;
    use mockito::Matcher;

    fn metadata(size: u64) -> FileMetadata {
        FileMetadata {
            path: "datasets/cpih/data.csv".to_string(),
            is_publishable: true,
            collection_id: Some("col-1".to_string()),
            bundle_id: None,
            title: "CPIH".to_string(),
            size_in_bytes: size,
            content_type: "text/csv".to_string(),
            licence: "OGL v3".to_string(),
            licence_url: "http://licence.example".to_string(),
            content_item: None,
        }
    }

    fn field(name: &str, value: &str) -> Matcher {
        Matcher::Regex(format!(
            "name=\"{}\"\r\n\r\n{}\r\n",
            regex_escape(name),
            regex_escape(value)
        ))
    }

    fn regex_escape(value: &str) -> String {
        value
            .chars()
            .flat_map(|c| {
                if "\\.+*?()|[]{}^$".contains(c) {
                    vec!['\\', c]
                } else {
                    vec![c]
                }
            })
            .collect()
    }

    fn small_chunks() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 4,
            max_chunks: 3,
        }
    }

    #[tokio::test]
    async fn test_file_too_large_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-new")
            .expect(0)
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::default())
            .unwrap()
            .with_chunking(small_chunks());
        let result = client.upload(&b"0123456789abc"[..], &metadata(13)).await;

        match result {
            Err(SdkError::FileTooLarge { size, max_bytes }) => {
                assert_eq!(size, 13);
                assert_eq!(max_bytes, 12);
            }
            other => panic!("Expected FileTooLarge variant, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_file_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-new")
            .expect(0)
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::default()).unwrap();
        let result = client.upload(&b""[..], &metadata(0)).await;

        assert!(matches!(result, Err(SdkError::EmptyFile)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_sends_every_chunk_in_order() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/upload-new")
            .match_header("authorization", "Bearer svc-token")
            .match_body(Matcher::AllOf(vec![
                field("resumableChunkNumber", "1"),
                field("resumableTotalChunks", "3"),
                field("path", "datasets/cpih/data.csv"),
                field("resumableFilename", "data.csv"),
                field("resumableTotalSize", "10"),
                field("collectionId", "col-1"),
                Matcher::Regex("filename=\"data.csv\"\r\n\r\n0123\r\n".to_string()),
            ]))
            .with_status(200)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/upload-new")
            .match_body(Matcher::AllOf(vec![
                field("resumableChunkNumber", "2"),
                Matcher::Regex("\r\n\r\n4567\r\n".to_string()),
            ]))
            .with_status(200)
            .create_async()
            .await;
        let last = server
            .mock("POST", "/upload-new")
            .match_body(Matcher::AllOf(vec![
                field("resumableChunkNumber", "3"),
                Matcher::Regex("\r\n\r\n89\r\n".to_string()),
            ]))
            .with_status(201)
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::with_service_token("svc-token"))
            .unwrap()
            .with_chunking(small_chunks());
        client
            .upload(&b"0123456789"[..], &metadata(10))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        last.assert_async().await;
    }

    #[tokio::test]
    async fn test_content_item_fields_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-new")
            .match_body(Matcher::AllOf(vec![
                field("datasetId", "cpih"),
                field("edition", "time-series"),
                field("version", "1"),
            ]))
            .with_status(201)
            .create_async()
            .await;

        let mut meta = metadata(2);
        meta.content_item = Some(ContentItem {
            dataset_id: "cpih".to_string(),
            edition: "time-series".to_string(),
            version: "1".to_string(),
        });

        let client = UploadClient::new(server.url(), Headers::default())
            .unwrap()
            .with_chunking(small_chunks());
        client.upload(&b"ab"[..], &meta).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_stops_at_first_rejected_chunk() {
        let mut server = mockito::Server::new_async().await;
        let rejected = server
            .mock("POST", "/upload-new")
            .with_status(400)
            .with_body(concat!(
                r#"{"errors":[{"code":"ChunkTooSmall","#,
                r#""description":"chunk size below minimum 5MB"}]}"#
            ))
            .expect(1)
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::default())
            .unwrap()
            .with_chunking(small_chunks());
        let result = client.upload(&b"0123456789"[..], &metadata(10)).await;

        match result {
            Err(SdkError::Api { status, errors }) => {
                assert_eq!(status, 400);
                assert_eq!(errors.first_code(), Some("ChunkTooSmall"));
            }
            other => panic!("Expected Api variant, got {:?}", other),
        }
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn test_unparseable_error_body_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload-new")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::default()).unwrap();
        match client.upload(&b"ab"[..], &metadata(2)).await {
            Err(SdkError::Api { status, errors }) => {
                assert_eq!(status, 502);
                assert!(errors.errors.is_empty());
            }
            other => panic!("Expected Api variant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_content_is_io_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-new")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let client = UploadClient::new(server.url(), Headers::default())
            .unwrap()
            .with_chunking(small_chunks());
        let result = client.upload(&b"012345"[..], &metadata(10)).await;

        match result {
            Err(SdkError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected Io variant, got {:?}", other),
        }
        mock.assert_async().await;
    }
}
