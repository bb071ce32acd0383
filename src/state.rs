//! Application state management

use std::sync::Arc;

use chrono::Duration;

use crate::accounts::{AccountStore, StoreError};
use crate::auth::TokenService;
use crate::config::Config;
use crate::document::RasterExtractor;
use crate::ocr::{OcrService, OcrServiceConfig};
use crate::upload::{OcrPipeline, StagingArea};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to load accounts: {0}")]
    Accounts(#[from] StoreError),

    #[error("Failed to prepare staging directory: {0}")]
    Staging(#[from] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    accounts: AccountStore,
    tokens: TokenService,
    pipeline: OcrPipeline,
}

impl AppState {
    /// Create the application state with the OCR backends named in `config`
    pub async fn new(config: Config) -> Result<Self, StateError> {
        let ocr = OcrService::new(OcrServiceConfig::from(&config.ocr));
        Self::with_ocr_service(config, ocr).await
    }

    /// Create the application state around an already built OCR service
    pub async fn with_ocr_service(config: Config, ocr: OcrService) -> Result<Self, StateError> {
        let accounts =
            AccountStore::load(&config.storage.users_file, config.auth.bcrypt_cost).await?;
        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            Duration::minutes(config.auth.token_ttl_minutes),
        );

        let staging = StagingArea::new(&config.storage.upload_dir)?;
        let extractor = RasterExtractor::new(config.ocr.pdf_render_scale);
        let pipeline = OcrPipeline::new(staging, extractor, ocr);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                accounts,
                tokens,
                pipeline,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the account store
    pub fn accounts(&self) -> &AccountStore {
        &self.inner.accounts
    }

    /// Get the token service
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the OCR pipeline
    pub fn pipeline(&self) -> &OcrPipeline {
        &self.inner.pipeline
    }
}
