use serde::{Deserialize, Serialize};

/// One entry of the error body shared by this service and the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonError {
    pub code: String,
    pub description: String,
}

/// Wire shape `{"errors":[{"code","description"}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonErrors {
    #[serde(default)]
    pub errors: Vec<JsonError>,
}

impl JsonErrors {
    pub fn single(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            errors: vec![JsonError {
                code: code.into(),
                description: description.into(),
            }],
        }
    }

    pub fn first_code(&self) -> Option<&str> {
        self.errors.first().map(|e| e.code.as_str())
    }
}

impl std::fmt::Display for JsonErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.description))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}
