//! Raster extraction for staged uploads
//!
//! Decoding and rendering are CPU-bound, so both run on the blocking pool.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Document, Matrix};

use super::error::{DocumentError, DocumentResult};
use super::types::{DocumentKind, RasterPage};

const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 4.0;

/// Converts a document on disk into one raster per page
#[derive(Debug, Clone)]
pub struct RasterExtractor {
    /// Linear scale for PDF rendering (1.0 = 72 DPI)
    scale: f32,
}

impl RasterExtractor {
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Produce the rasters for `path`, in page order
    pub async fn extract(&self, path: &Path, kind: DocumentKind) -> DocumentResult<Vec<RasterPage>> {
        let path = path.to_path_buf();
        let scale = self.scale;

        tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Image => load_image(&path).map(|page| vec![page]),
            DocumentKind::Pdf => render_pdf(&path, scale),
        })
        .await
        .map_err(|e| DocumentError::RenderError(format!("Task join error: {}", e)))?
    }
}

fn load_image(path: &Path) -> DocumentResult<RasterPage> {
    let data = std::fs::read(path)?;
    let image = image::load_from_memory(&data)?;

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Decoded image upload"
    );

    Ok(RasterPage::new(0, image))
}

fn render_pdf(path: &Path, scale: f32) -> DocumentResult<Vec<RasterPage>> {
    let path_str = path.to_string_lossy();
    let doc = Document::open(&*path_str)?;
    let page_count = doc.page_count()?;

    if page_count <= 0 {
        return Err(DocumentError::Decode("PDF has no pages".to_string()));
    }

    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let mut pages = Vec::with_capacity(page_count as usize);

    for index in 0..page_count {
        let page = doc.load_page(index)?;
        let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;
        let image = pixmap_to_image(&pixmap)?;
        pages.push(RasterPage::new(index as usize, image));
    }

    tracing::debug!(
        path = %path.display(),
        pages = pages.len(),
        scale,
        "Rendered PDF upload"
    );

    Ok(pages)
}

fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> DocumentResult<DynamicImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    if n < 3 {
        return Err(DocumentError::RenderError(format!(
            "Unexpected pixmap component count: {}",
            n
        )));
    }

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            let g = samples.get(offset + 1).copied().unwrap_or(255);
            let b = samples.get(offset + 2).copied().unwrap_or(255);
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    let img = RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| DocumentError::ImageError("Failed to create image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgb8(img))
}
