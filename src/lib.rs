//! OCR Server Library
//!
//! Upload an image or PDF, get its text back as JSON. The server binary is in
//! main.rs; everything it wires together lives here so it can be tested.
//!
//! # Modules
//!
//! - `document`: Raster extraction (images, PDF pages via MuPDF)
//! - `ocr`: OCR providers and page-ordered text assembly
//! - `upload`: Multipart validation, staging and the OCR pipeline
//! - `accounts`: JSON-file backed user accounts
//! - `auth`: Session tokens and the request guard
//! - `routes`: HTTP surface

pub mod accounts;
pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod ocr;
pub mod routes;
pub mod state;
pub mod upload;
