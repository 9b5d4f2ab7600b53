//! Upload form decoding and validation

use crate::error::RequestError;
use chunkgate_core::constants::MAX_CHUNKS;
use chunkgate_core::{ContentItem, FileMetadata, JsonError, ResumableChunk};
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use validator::{Validate, ValidationError, ValidationErrors};

static UPLOAD_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._\-/]{1,1024}$").ok());

static MIME_TYPE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9!#$&^_.+\-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.+\-]*(\s*;.*)?$")
        .ok()
});

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

fn validate_upload_path(path: &str) -> Result<(), ValidationError> {
    if !matches(&UPLOAD_PATH, path)
        || path.starts_with('/')
        || path.split('/').any(|segment| segment == "..")
    {
        return Err(ValidationError::new("aws-upload-key"));
    }
    Ok(())
}

fn validate_mime_type(value: &str) -> Result<(), ValidationError> {
    if matches(&MIME_TYPE, value) {
        Ok(())
    } else {
        Err(ValidationError::new("mime-type"))
    }
}

fn validate_form(form: &UploadForm) -> Result<(), ValidationError> {
    if form.collection_id.is_some() && form.bundle_id.is_some() {
        return Err(ValidationError::new("collectionId-bundleId-exclusive"));
    }
    if let (Some(current), Some(total)) = (form.chunk_number, form.total_chunks) {
        if current > total {
            return Err(ValidationError::new("resumableChunkNumber-lte-resumableTotalChunks"));
        }
    }
    Ok(())
}

/// Decoded multipart fields of one chunk upload
#[derive(Debug, Default, Validate)]
#[validate(schema(function = "validate_form"))]
pub struct UploadForm {
    #[validate(required, custom(function = "validate_upload_path"))]
    pub path: Option<String>,
    #[validate(required)]
    pub is_publishable: Option<bool>,
    pub collection_id: Option<String>,
    pub bundle_id: Option<String>,
    pub title: Option<String>,
    #[validate(required, range(min = 1))]
    pub total_size: Option<u64>,
    #[validate(required, custom(function = "validate_mime_type"))]
    pub resumable_type: Option<String>,
    #[validate(required)]
    pub licence: Option<String>,
    #[validate(required)]
    pub licence_url: Option<String>,
    pub file_name: Option<String>,
    #[validate(required, range(min = 1, max = MAX_CHUNKS))]
    pub chunk_number: Option<u32>,
    #[validate(required, range(min = 1, max = MAX_CHUNKS))]
    pub total_chunks: Option<u32>,
    pub dataset_id: Option<String>,
    pub edition: Option<String>,
    pub version: Option<String>,
}

fn text(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn parsed<T: FromStr>(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, RequestError> {
    match text(fields, name) {
        Some(value) => value.parse().map(Some).map_err(|_| {
            RequestError::ParsingForm(format!("{} has invalid value {:?}", name, value))
        }),
        None => Ok(None),
    }
}

/// Form field name as sent on the wire
fn wire_name(field: &str) -> &str {
    match field {
        "is_publishable" => "isPublishable",
        "collection_id" => "collectionId",
        "bundle_id" => "bundleId",
        "total_size" => "resumableTotalSize",
        "resumable_type" => "resumableType",
        "licence_url" => "licenceUrl",
        "file_name" => "resumableFilename",
        "chunk_number" => "resumableChunkNumber",
        "total_chunks" => "resumableTotalChunks",
        other => other,
    }
}

/// One `ValidationError` entry per failed rule, ordered by field
pub fn validation_errors(errors: &ValidationErrors) -> Vec<JsonError> {
    let mut entries: Vec<JsonError> = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let description = if field == "__all__" {
                error.code.to_string()
            } else {
                format!("{} {}", wire_name(&field), error.code)
            };
            entries.push(JsonError {
                code: "ValidationError".to_string(),
                description,
            });
        }
    }
    entries.sort_by(|a, b| a.description.cmp(&b.description));
    entries
}

impl UploadForm {
    /// Decode text fields; values that cannot be parsed are a form error
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, RequestError> {
        Ok(Self {
            path: text(fields, "path"),
            is_publishable: parsed(fields, "isPublishable")?,
            collection_id: text(fields, "collectionId"),
            bundle_id: text(fields, "bundleId"),
            title: text(fields, "title"),
            total_size: parsed(fields, "resumableTotalSize")?,
            resumable_type: text(fields, "resumableType"),
            licence: text(fields, "licence"),
            licence_url: text(fields, "licenceUrl"),
            file_name: text(fields, "resumableFilename"),
            chunk_number: parsed(fields, "resumableChunkNumber")?,
            total_chunks: parsed(fields, "resumableTotalChunks")?,
            dataset_id: text(fields, "datasetId"),
            edition: text(fields, "edition"),
            version: text(fields, "version"),
        })
    }

    /// Run every rule, collecting all failures
    pub fn check(&self) -> Result<(), RequestError> {
        self.validate()
            .map_err(|e| RequestError::Validation(validation_errors(&e)))
    }

    /// Split a validated form into the registered metadata and the chunk position
    pub fn into_parts(self) -> (FileMetadata, ResumableChunk) {
        let content_item = match (self.dataset_id, self.edition, self.version) {
            (Some(dataset_id), Some(edition), Some(version)) => Some(ContentItem {
                dataset_id,
                edition,
                version,
            }),
            _ => None,
        };

        let metadata = FileMetadata {
            path: self.path.unwrap_or_default(),
            is_publishable: self.is_publishable.unwrap_or_default(),
            collection_id: self.collection_id,
            bundle_id: self.bundle_id,
            title: self.title.unwrap_or_default(),
            size_in_bytes: self.total_size.unwrap_or_default(),
            content_type: self.resumable_type.clone().unwrap_or_default(),
            licence: self.licence.unwrap_or_default(),
            licence_url: self.licence_url.unwrap_or_default(),
            content_item,
        };

        let chunk = ResumableChunk {
            file_name: self
                .file_name
                .unwrap_or_else(|| metadata.file_name().to_string()),
            declared_type: self.resumable_type.unwrap_or_default(),
            current_chunk: self.chunk_number.unwrap_or_default(),
            total_chunks: self.total_chunks.unwrap_or_default(),
        };

        (metadata, chunk)
    }
}
