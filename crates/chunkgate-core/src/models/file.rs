use serde::{Deserialize, Serialize};

/// Descriptive record for one logical file, as registered with the metadata service.
///
/// `path` doubles as the object-storage key and is never changed after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    pub is_publishable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Declared size of the whole file, not of one chunk
    pub size_in_bytes: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub licence: String,
    pub licence_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_item: Option<ContentItem>,
}

/// Dataset release a file belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub dataset_id: String,
    pub edition: String,
    pub version: String,
}

impl FileMetadata {
    /// Last path segment, used as the resumable file name
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}
