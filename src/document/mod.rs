//! Raster extraction
//!
//! Turns a staged upload into one bitmap per page so the OCR layer only ever
//! sees rasters.
//!
//! - Images (PNG, JPEG, GIF) decode to a single page via the `image` crate.
//! - PDFs are opened with MuPDF and every page is rendered, in page order,
//!   at the configured linear scale.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ocr_server::document::{DocumentKind, RasterExtractor};
//!
//! let extractor = RasterExtractor::new(2.0);
//! let pages = extractor.extract(&path, DocumentKind::Pdf).await?;
//! ```

mod error;
mod raster;
mod types;

pub use error::{DocumentError, DocumentResult};
pub use raster::RasterExtractor;
pub use types::{DocumentKind, RasterPage, ALLOWED_EXTENSIONS};
