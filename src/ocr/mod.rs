//! OCR Module
//!
//! Recognizes text in page rasters and joins the fragments of a document.
//!
//! Supports multiple backends:
//! - Tesseract (local, requires the `tesseract` binary)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_server::ocr::{OcrService, OcrServiceConfig};
//!
//! let service = OcrService::new(OcrServiceConfig::default());
//!
//! // Check available providers
//! let providers = service.available_providers().await;
//!
//! // OCR every page of a document, in order
//! let text = service.recognize_pages(&pages).await?;
//! println!("{}", text.joined());
//! ```

mod provider;
mod service;
mod types;

pub use provider::{OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use service::{OcrService, OcrServiceConfig};
pub use types::{OcrError, OcrProvider, OcrResult, TextResult, NO_TEXT_DETECTED};

#[cfg(test)]
pub use provider::MockProvider;
