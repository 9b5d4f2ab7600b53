//! Error types module
//!
//! Every failure the upload protocol can surface is a variant of [`UploadError`].
//! Variants self-describe their HTTP presentation through [`ErrorMetadata`], so the
//! API layer maps them with one exhaustive table instead of comparing error values.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for client-correctable issues
    Warn,
    /// Error level - for backend failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ChunkTooSmall")
    fn error_code(&self) -> &'static str;

    /// Whether the caller may safely resend the same chunk
    fn is_recoverable(&self) -> bool;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("failed to generate encryption key: {0}")]
    KeyGeneration(String),

    #[error("failed to write to vault: {0}")]
    VaultWrite(String),

    #[error("failed to read from vault: {0}")]
    VaultRead(String),

    #[error("encryption key is not valid hex: {0}")]
    InvalidEncryptionKey(String),

    #[error("chunk size below minimum 5MB")]
    ChunkTooSmall,

    #[error("invalid chunk position: {0}")]
    InvalidChunk(String),

    #[error("uploading part failed: {0}")]
    Upload(String),

    #[error("files API already contains a file with this path")]
    DuplicateFile,

    #[error("invalid data sent to files API: {0}")]
    Validation(String),

    #[error("not authorised to call files API")]
    Unauthorised,

    #[error("files API returned a server error")]
    Server,

    #[error("could not connect to files API: {0}")]
    Connection(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file was not in the expected state: {0}")]
    FileStateConflict(String),

    #[error("file not registered with files API: {0}")]
    FilesApiNotFound(String),

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("request timed out")]
    Timeout,
}

/// Result type for upload protocol operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        UploadError::KeyGeneration(_) => (500, "InternalError", true, true, LogLevel::Error),
        UploadError::VaultWrite(_) => (500, "InternalError", true, true, LogLevel::Error),
        UploadError::VaultRead(_) => (500, "InternalError", true, true, LogLevel::Error),
        UploadError::InvalidEncryptionKey(_) => {
            (500, "InternalError", false, true, LogLevel::Error)
        }
        UploadError::ChunkTooSmall => (400, "ChunkTooSmall", false, false, LogLevel::Warn),
        UploadError::InvalidChunk(_) => (400, "ValidationError", false, false, LogLevel::Debug),
        UploadError::Upload(_) => (500, "InternalError", true, true, LogLevel::Error),
        UploadError::DuplicateFile => (400, "DuplicateFile", false, false, LogLevel::Warn),
        UploadError::Validation(_) => {
            (500, "RemoteValidationError", false, false, LogLevel::Error)
        }
        UploadError::Unauthorised => (403, "Unauthorised", false, false, LogLevel::Warn),
        UploadError::Server => (500, "InternalError", true, false, LogLevel::Error),
        UploadError::Connection(_) => (500, "InternalError", true, true, LogLevel::Error),
        UploadError::FileNotFound(_) => (404, "FileNotFound", false, false, LogLevel::Warn),
        UploadError::FileStateConflict(_) => {
            (409, "FileStateConflict", false, false, LogLevel::Warn)
        }
        UploadError::FilesApiNotFound(_) => (404, "NotFound", false, false, LogLevel::Debug),
        UploadError::Unknown(_) => (500, "InternalError", false, true, LogLevel::Error),
        UploadError::Timeout => (504, "Timeout", true, false, LogLevel::Warn),
    }
}

impl UploadError {
    /// Get the error type name for structured logs
    pub fn error_type(&self) -> &'static str {
        match self {
            UploadError::KeyGeneration(_) => "KeyGeneration",
            UploadError::VaultWrite(_) => "VaultWrite",
            UploadError::VaultRead(_) => "VaultRead",
            UploadError::InvalidEncryptionKey(_) => "InvalidEncryptionKey",
            UploadError::ChunkTooSmall => "ChunkTooSmall",
            UploadError::InvalidChunk(_) => "InvalidChunk",
            UploadError::Upload(_) => "Upload",
            UploadError::DuplicateFile => "DuplicateFile",
            UploadError::Validation(_) => "Validation",
            UploadError::Unauthorised => "Unauthorised",
            UploadError::Server => "Server",
            UploadError::Connection(_) => "Connection",
            UploadError::FileNotFound(_) => "FileNotFound",
            UploadError::FileStateConflict(_) => "FileStateConflict",
            UploadError::FilesApiNotFound(_) => "FilesApiNotFound",
            UploadError::Unknown(_) => "Unknown",
            UploadError::Timeout => "Timeout",
        }
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        upload_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        upload_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        if self.is_sensitive() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_duplicate_file() {
        let err = UploadError::DuplicateFile;
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "DuplicateFile");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_chunk_too_small_is_client_error() {
        let err = UploadError::ChunkTooSmall;
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "ChunkTooSmall");
        assert_eq!(err.client_message(), "chunk size below minimum 5MB");
    }

    #[test]
    fn test_error_metadata_remote_validation_is_server_fault() {
        let err = UploadError::Validation("title missing".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "RemoteValidationError");
    }

    #[test]
    fn test_error_metadata_state_conflict() {
        let err = UploadError::FileStateConflict("a/b.csv".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "FileStateConflict");
    }

    #[test]
    fn test_error_metadata_status_not_found() {
        let err = UploadError::FilesApiNotFound("a/b.csv".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NotFound");
    }

    #[test]
    fn test_downstream_unavailable_errors_are_recoverable() {
        for err in [
            UploadError::Connection("refused".to_string()),
            UploadError::VaultRead("sealed".to_string()),
            UploadError::VaultWrite("sealed".to_string()),
            UploadError::Server,
        ] {
            assert_eq!(err.http_status_code(), 500);
            assert!(err.is_recoverable(), "{} should be recoverable", err.error_type());
        }
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let err = UploadError::VaultRead("token abc rejected".to_string());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("abc"));
        assert_eq!(err.error_code(), "InternalError");
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let err = UploadError::Timeout;
        assert_eq!(err.http_status_code(), 504);
        assert_eq!(err.error_type(), "Timeout");
    }
}
