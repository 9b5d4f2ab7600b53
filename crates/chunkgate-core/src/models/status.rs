use crate::models::file::FileMetadata;
use serde::{Deserialize, Serialize};

/// Outcome of one independent backend probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Composite view of one file across the metadata service, the object store
/// and (when encryption is enabled) the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub metadata: FileMetadata,
    pub file_content: ProbeResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<ProbeResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_probe_omits_error() {
        let json = serde_json::to_value(ProbeResult::valid()).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": true }));
    }

    #[test]
    fn test_invalid_probe_carries_error() {
        let json = serde_json::to_value(ProbeResult::invalid("NoSuchKey")).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"], "NoSuchKey");
    }
}
