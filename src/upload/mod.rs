//! Upload pipeline
//!
//! Receives a multipart upload, validates it, stages it on disk and runs
//! raster extraction plus OCR over it:
//!
//! ```text
//! multipart ──► UploadedDocument ──► StagingArea ──► RasterExtractor ──► OcrService
//!                (validation)        (staged file,     (one raster        (fragments in
//!                                     always removed)   per page)          page order)
//! ```

mod pipeline;
mod staging;
mod types;

pub use pipeline::{ExtractionError, OcrPipeline};
pub use staging::{StagedFile, StagingArea};
pub use types::{sanitize_filename, UploadError, UploadedDocument, UPLOAD_FIELD};
