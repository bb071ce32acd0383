//! OCR Types
//!
//! Defines types for OCR processing of page rasters.

use serde::{Deserialize, Serialize};

/// Text returned when a document yields no fragments at all
pub const NO_TEXT_DETECTED: &str = "No text detected in the document.";

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract OCR (local)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

/// OCR result for a single raster
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Paragraph-level fragments in detection order
    pub fragments: Vec<String>,
    /// Mean confidence score (0-100), when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Provider used
    pub provider: OcrProvider,
}

/// Recognized text of a whole document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextResult {
    /// Fragments of every page, page 1 first
    pub fragments: Vec<String>,
    /// Number of pages that went through OCR
    pub pages: usize,
}

impl TextResult {
    /// Append the fragments of the next page
    pub fn push_page(&mut self, fragments: Vec<String>) {
        self.fragments.extend(fragments);
        self.pages += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Newline-joined text, or [`NO_TEXT_DETECTED`] when nothing was found
    pub fn joined(&self) -> String {
        if self.is_empty() {
            NO_TEXT_DETECTED.to_string()
        } else {
            self.fragments.join("\n")
        }
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Failed to prepare image: {0}")]
    ImageExtractionError(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::ProviderNotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ImageExtractionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}
