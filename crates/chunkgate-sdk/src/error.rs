use chunkgate_core::JsonErrors;

/// Failures surfaced to SDK callers
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("file too large: {size} bytes, max file size: {max_bytes} bytes")]
    FileTooLarge { size: u64, max_bytes: u64 },

    #[error("file is empty")]
    EmptyFile,

    #[error("{}", api_error_message(*status, errors))]
    Api { status: u16, errors: JsonErrors },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read file content: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;

fn api_error_message(status: u16, errors: &JsonErrors) -> String {
    let mut message = format!("API error: status code {}", status);
    for error in &errors.errors {
        message.push_str(&format!(
            "\n  - code: {}, description: {}",
            error.code, error.description
        ));
    }
    message
}

impl SdkError {
    /// Machine code of the first server error, if the server sent any
    pub fn api_code(&self) -> Option<&str> {
        match self {
            SdkError::Api { errors, .. } => errors.first_code(),
            _ => None,
        }
    }
}
