//! Upload types and validation

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::document::DocumentKind;

/// Longest stem kept by `sanitize_filename`; staged names add a 33 byte prefix
const MAX_STEM_LEN: usize = 100;
const MAX_EXT_LEN: usize = 8;

/// Multipart field carrying the document
pub const UPLOAD_FIELD: &str = "file";

/// Upload validation errors (400, except `TooLarge` which is 413)
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file part in the request")]
    NoFilePart,

    #[error("No file selected")]
    NoSelectedFile,

    #[error("File type not allowed: {0}")]
    FileTypeNotAllowed(String),

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Failed to read upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the {0} byte limit")]
    TooLarge(usize),
}

impl UploadError {
    /// Machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoFilePart => "no_file",
            Self::NoSelectedFile => "no_selected_file",
            Self::FileTypeNotAllowed(_) => "file_type_not_allowed",
            Self::EmptyFile => "empty_file",
            Self::InvalidUpload(_) => "invalid_upload",
            Self::TooLarge(_) => "payload_too_large",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Classify a failure while reading the multipart stream
    pub fn from_multipart_error(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge(limit)
        } else {
            Self::InvalidUpload(err.body_text())
        }
    }
}

/// A validated upload, held in memory until it is staged
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// File name as sent by the client
    pub original_name: String,
    /// Sanitized file name, always ending in the lowercase extension
    pub file_name: String,
    pub kind: DocumentKind,
    pub data: Bytes,
}

impl UploadedDocument {
    /// Validate a received file part
    pub fn new(file_name: Option<String>, data: Bytes) -> Result<Self, UploadError> {
        let original_name = file_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(UploadError::NoSelectedFile)?;

        let kind = DocumentKind::from_file_name(&original_name)
            .ok_or_else(|| UploadError::FileTypeNotAllowed(original_name.clone()))?;

        if data.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        Ok(Self {
            file_name: sanitize_filename(&original_name),
            original_name,
            kind,
            data,
        })
    }

    /// Read the `file` field out of a multipart body whose size is capped
    /// at `limit` bytes
    pub async fn from_multipart(
        multipart: &mut Multipart,
        limit: usize,
    ) -> Result<Self, UploadError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::from_multipart_error(e, limit))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                tracing::debug!(field = ?field.name(), "Skipping multipart field");
                continue;
            }

            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| UploadError::from_multipart_error(e, limit))?;

            tracing::debug!(file_name = ?file_name, size = data.len(), "Received upload");
            return Self::new(file_name, data);
        }

        Err(UploadError::NoFilePart)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Reduce a client file name to a safe, flat name.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]`
/// are removed (whitespace becomes `_`), the stem is capped at 100 characters,
/// and the final extension is kept in lowercase so the staged file still opens
/// with the right decoder.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext.to_ascii_lowercase())),
        None => (base, None),
    };

    let cleaned: String = stem
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    // Only ASCII survives the filter, so byte and char offsets agree
    let cleaned = cleaned[..cleaned.len().min(MAX_STEM_LEN)].trim_end_matches(['.', '_']);
    let stem = if cleaned.is_empty() { "upload" } else { cleaned };

    let ext: Option<String> = ext
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(MAX_EXT_LEN)
                .collect()
        })
        .filter(|e: &String| !e.is_empty());

    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}
