//! OCR Service
//!
//! Orchestrates OCR providers and runs them over every page of a document.

use std::sync::Arc;

use super::{
    provider::{OcrProviderTrait, OllamaProvider, TesseractProvider},
    types::{OcrError, OcrProvider, OcrResult, TextResult},
};
use crate::config::OcrConfig;
use crate::document::RasterPage;

/// OCR service configuration
pub struct OcrServiceConfig {
    /// Preferred provider order
    pub providers: Vec<OcrProvider>,
    /// Tesseract binary
    pub tesseract_cmd: String,
    /// Ollama base URL
    pub ollama_url: String,
    /// Ollama model name
    pub ollama_model: String,
    /// OCR language
    pub language: String,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            providers: vec![OcrProvider::Tesseract],
            tesseract_cmd: "tesseract".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl From<&OcrConfig> for OcrServiceConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            providers: config.backends.clone(),
            tesseract_cmd: config.tesseract_cmd.clone(),
            ollama_url: config.ollama_url.clone(),
            ollama_model: config.ollama_model.clone(),
            language: config.language.clone(),
        }
    }
}

/// OCR service for page rasters
pub struct OcrService {
    language: String,
    providers: Vec<Arc<dyn OcrProviderTrait>>,
}

impl OcrService {
    /// Create a new OCR service with providers in configured order
    pub fn new(config: OcrServiceConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|provider| -> Arc<dyn OcrProviderTrait> {
                match provider {
                    OcrProvider::Tesseract => Arc::new(TesseractProvider::new(&config.tesseract_cmd)),
                    OcrProvider::Ollama => {
                        Arc::new(OllamaProvider::new(&config.ollama_url, &config.ollama_model))
                    }
                }
            })
            .collect();

        Self {
            language: config.language,
            providers,
        }
    }

    /// Create a service over an explicit provider list
    pub fn with_providers(language: &str, providers: Vec<Arc<dyn OcrProviderTrait>>) -> Self {
        Self {
            language: language.to_string(),
            providers,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get available providers
    pub async fn available_providers(&self) -> Vec<OcrProvider> {
        self.reachable()
            .await
            .iter()
            .map(|provider| provider.provider_type())
            .collect()
    }

    /// Providers that answer their availability check, in configured order
    async fn reachable(&self) -> Vec<Arc<dyn OcrProviderTrait>> {
        let mut available = Vec::new();
        for provider in &self.providers {
            if provider.is_available().await {
                available.push(Arc::clone(provider));
            }
        }
        available
    }

    /// Perform OCR on one PNG-encoded raster, first working provider wins
    pub async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let providers = self.reachable().await;
        self.recognize_with(&providers, image_data).await
    }

    async fn recognize_with(
        &self,
        providers: &[Arc<dyn OcrProviderTrait>],
        image_data: &[u8],
    ) -> Result<OcrResult, OcrError> {
        let mut last_error = None;

        for provider in providers {
            match provider.recognize(image_data, &self.language).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        "OCR provider {:?} failed: {}, trying next",
                        provider.provider_type(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::ProviderNotAvailable("No OCR providers available".to_string())
        }))
    }

    /// OCR every page and concatenate the fragments in page order
    pub async fn recognize_pages(&self, pages: &[RasterPage]) -> Result<TextResult, OcrError> {
        let providers = self.reachable().await;
        if providers.is_empty() {
            return Err(OcrError::ProviderNotAvailable(
                "No OCR providers available".to_string(),
            ));
        }

        let mut text = TextResult::default();

        for page in pages {
            let png = page
                .to_png()
                .map_err(|e| OcrError::ImageExtractionError(e.to_string()))?;

            let result = self.recognize_with(&providers, &png).await?;

            tracing::debug!(
                page = page.index + 1,
                fragments = result.fragments.len(),
                confidence = ?result.confidence,
                provider = ?result.provider,
                "Page recognized"
            );

            text.push_page(result.fragments);
        }

        Ok(text)
    }
}
