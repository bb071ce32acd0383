//! Document error types

use thiserror::Error;

/// Error raised while turning a document into rasters
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be decoded as the declared format
    #[error("Decode error: {0}")]
    Decode(String),

    /// Failed to rasterize a decoded page
    #[error("Render error: {0}")]
    RenderError(String),

    /// Image processing error
    #[error("Image error: {0}")]
    ImageError(String),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Decode(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::Decode(err.to_string())
    }
}
