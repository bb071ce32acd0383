//! Stage → rasterize → OCR → clean up

use std::path::Path;

use crate::document::{DocumentError, DocumentKind, RasterExtractor};
use crate::ocr::{OcrError, OcrService, TextResult};

use super::staging::StagingArea;
use super::types::UploadedDocument;

/// Why a validated upload produced no text
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Could not write the upload to the staging directory
    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Runs an upload through raster extraction and OCR
pub struct OcrPipeline {
    staging: StagingArea,
    extractor: RasterExtractor,
    ocr: OcrService,
}

impl OcrPipeline {
    pub fn new(staging: StagingArea, extractor: RasterExtractor, ocr: OcrService) -> Self {
        Self {
            staging,
            extractor,
            ocr,
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    /// Extract the text of `doc`.
    ///
    /// The staged copy is removed before this returns, whatever the outcome.
    pub async fn process(&self, doc: &UploadedDocument) -> Result<TextResult, ExtractionError> {
        let staged = self
            .staging
            .stage(doc)
            .await
            .map_err(ExtractionError::Staging)?;

        let outcome = self.extract(staged.path(), doc.kind).await;
        staged.remove().await;

        match &outcome {
            Ok(text) => tracing::info!(
                file_name = %doc.original_name,
                kind = ?doc.kind,
                pages = text.pages,
                fragments = text.fragments.len(),
                "OCR complete"
            ),
            Err(e) => tracing::error!(
                file_name = %doc.original_name,
                kind = ?doc.kind,
                "Error extracting text: {}",
                e
            ),
        }

        outcome
    }

    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<TextResult, ExtractionError> {
        let pages = self.extractor.extract(path, kind).await?;
        let text = self.ocr.recognize_pages(&pages).await?;
        Ok(text)
    }
}
