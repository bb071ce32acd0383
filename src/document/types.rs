//! Core document types

use std::io::Cursor;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::error::{DocumentError, DocumentResult};

/// Extensions accepted by the upload routes (lowercase, without the dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "pdf"];

/// How an upload is turned into rasters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Single raster image (PNG, JPEG, GIF)
    Image,
    /// PDF, rendered page by page
    Pdf,
}

impl DocumentKind {
    /// Detect kind from file extension. Returns `None` for anything outside
    /// the allow-list.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        Some(if ext == "pdf" { Self::Pdf } else { Self::Image })
    }

    /// Detect kind from a file name's final extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// One page of a document as a bitmap
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// Page index (0-based, document order)
    pub index: usize,
    pub image: DynamicImage,
}

impl RasterPage {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG, the interchange format handed to OCR providers
    pub fn to_png(&self) -> DocumentResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| DocumentError::ImageError(format!("Failed to encode page: {}", e)))?;
        Ok(buffer)
    }
}
