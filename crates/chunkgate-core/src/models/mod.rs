pub mod file;
pub mod json_errors;
pub mod key;
pub mod status;
pub mod upload;

pub use file::{ContentItem, FileMetadata};
pub use json_errors::{JsonError, JsonErrors};
pub use key::EncryptionKey;
pub use status::{ProbeResult, Status};
pub use upload::{normalize_etag, CallerContext, ResumableChunk, UploadCompletion};
