//! OCR Providers
//!
//! Defines the provider trait and implementations for different OCR backends.

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{OcrError, OcrProvider, OcrResult};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Perform OCR on a PNG-encoded raster, returning paragraph fragments
    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError>;
}

/// Tesseract OCR provider
///
/// Runs the `tesseract` binary with TSV output and groups recognized words
/// by block and paragraph.
pub struct TesseractProvider {
    /// Binary to invoke
    command: String,
}

impl TesseractProvider {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        let input_path =
            std::env::temp_dir().join(format!("ocr_input_{}.png", uuid::Uuid::new_v4()));

        tokio::fs::write(&input_path, image_data)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let output = Command::new(&self.command)
            .arg(&input_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg("3")
            .arg("tsv")
            .output()
            .await;

        if let Err(e) = tokio::fs::remove_file(&input_path).await {
            tracing::warn!(path = %input_path.display(), "Failed to remove OCR temp file: {}", e);
        }

        let output =
            output.map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let (fragments, confidence) = parse_tsv(&tsv);

        Ok(OcrResult {
            fragments,
            confidence,
            provider: OcrProvider::Tesseract,
        })
    }
}

/// Group Tesseract TSV word rows into paragraph fragments.
///
/// Paragraphs keep the order in which Tesseract first reports them; words
/// keep their reading order. Returns the fragments and the mean word
/// confidence.
pub(crate) fn parse_tsv(tsv: &str) -> (Vec<String>, Option<f64>) {
    // (page, block, par) -> words, ordered by first appearance
    let mut order: Vec<(u32, u32, u32)> = Vec::new();
    let mut paragraphs: BTreeMap<(u32, u32, u32), Vec<String>> = BTreeMap::new();
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0usize;

    for line in tsv.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 || columns[0] != "5" {
            continue;
        }

        let word = columns[11].trim();
        if word.is_empty() {
            continue;
        }

        let key = match (
            columns[1].parse::<u32>(),
            columns[2].parse::<u32>(),
            columns[3].parse::<u32>(),
        ) {
            (Ok(page), Ok(block), Ok(par)) => (page, block, par),
            _ => continue,
        };

        if let Ok(conf) = columns[10].parse::<f64>() {
            if conf >= 0.0 {
                confidence_sum += conf;
                confidence_count += 1;
            }
        }

        paragraphs
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(word.to_string());
    }

    let fragments = order
        .iter()
        .filter_map(|key| paragraphs.remove(key))
        .map(|words| words.join(" "))
        .collect();

    let confidence = (confidence_count > 0).then(|| confidence_sum / confidence_count as f64);
    (fragments, confidence)
}

/// Split free-form text into paragraph fragments on blank lines
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                fragments.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        fragments.push(current.join(" "));
    }
    fragments
}

/// Ollama vision model provider
pub struct OllamaProvider {
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        use base64::Engine;

        let url = format!("{}/api/generate", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let prompt = format!(
            "Extract all text from this image exactly as written. The text language code is {}. \
             Separate paragraphs with a blank line and return only the extracted text, nothing else.",
            language
        );

        let request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [image_base64],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = result["response"].as_str().unwrap_or("");

        Ok(OcrResult {
            fragments: split_paragraphs(text),
            confidence: None, // LLMs don't provide confidence scores
            provider: OcrProvider::Ollama,
        })
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: OcrResult,
    pub available: bool,
}

#[cfg(test)]
impl MockProvider {
    /// Available provider that answers every page with `fragments`
    pub fn returning(fragments: &[&str]) -> Self {
        Self {
            response: OcrResult {
                fragments: fragments.iter().map(|s| s.to_string()).collect(),
                confidence: Some(90.0),
                provider: OcrProvider::Tesseract,
            },
            available: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        self.response.provider
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, _image_data: &[u8], _language: &str) -> Result<OcrResult, OcrError> {
        Ok(self.response.clone())
    }
}
