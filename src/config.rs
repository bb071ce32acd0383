//! Configuration management for the OCR server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::ocr::OcrProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Body limit applied to the upload routes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the full account list
    pub users_file: PathBuf,
    /// Staging directory for uploads awaiting OCR
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Providers in preference order
    pub backends: Vec<OcrProvider>,
    pub language: String,
    pub tesseract_cmd: String,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Linear scale used when rasterizing PDF pages
    pub pdf_render_scale: f32,
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Longest accepted session lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from("./data/users.json"),
            upload_dir: PathBuf::from("./uploads"),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backends: vec![OcrProvider::Tesseract],
            language: "eng".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
            pdf_render_scale: 2.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests pass a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServerConfig::default();
        let storage_defaults = StorageConfig::default();
        let ocr_defaults = OcrConfig::default();

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let token_ttl_minutes = parse_or(&lookup, "TOKEN_TTL_MINUTES", 60i64)?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
            });
        }

        let backends = match lookup("OCR_BACKENDS") {
            Some(raw) => parse_backends(&raw)?,
            None => ocr_defaults.backends,
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(server_defaults.host),
                port: parse_or(&lookup, "SERVER_PORT", server_defaults.port)?,
                max_upload_bytes: parse_or(
                    &lookup,
                    "MAX_UPLOAD_BYTES",
                    server_defaults.max_upload_bytes,
                )?,
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_minutes,
                bcrypt_cost,
            },
            storage: StorageConfig {
                users_file: lookup("USERS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(storage_defaults.users_file),
                upload_dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(storage_defaults.upload_dir),
            },
            ocr: OcrConfig {
                backends,
                language: lookup("OCR_LANGUAGE").unwrap_or(ocr_defaults.language),
                tesseract_cmd: lookup("TESSERACT_CMD").unwrap_or(ocr_defaults.tesseract_cmd),
                ollama_url: lookup("OLLAMA_URL").unwrap_or(ocr_defaults.ollama_url),
                ollama_model: lookup("OLLAMA_MODEL").unwrap_or(ocr_defaults.ollama_model),
                pdf_render_scale: parse_or(
                    &lookup,
                    "PDF_RENDER_SCALE",
                    ocr_defaults.pdf_render_scale,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_backends(raw: &str) -> Result<Vec<OcrProvider>, ConfigError> {
    let mut backends = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let provider = match name.to_ascii_lowercase().as_str() {
            "tesseract" => OcrProvider::Tesseract,
            "ollama" => OcrProvider::Ollama,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "OCR_BACKENDS",
                    value: raw.to_string(),
                })
            }
        };
        if !backends.contains(&provider) {
            backends.push(provider);
        }
    }

    if backends.is_empty() {
        return Err(ConfigError::Invalid {
            key: "OCR_BACKENDS",
            value: raw.to_string(),
        });
    }
    Ok(backends)
}
