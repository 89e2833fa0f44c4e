//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::docx::DocumentAssembler;
use crate::ingest::IngestPipeline;
use crate::normalize::ImageNormalizer;
use crate::ocr::OcrService;
use crate::storage::LocalStorage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    pipeline: IngestPipeline,
}

impl AppState {
    /// Create a new application state
    ///
    /// The OCR service is passed in so tests can substitute a provider.
    pub fn new(config: Config, db: SqlitePool, ocr: OcrService) -> Self {
        let storage = LocalStorage::new(&config.storage, &config.server.public_base_url);
        let pipeline = IngestPipeline::new(
            storage,
            ImageNormalizer::new(config.normalize.clone()),
            ocr,
            DocumentAssembler::new(config.assembly.clone()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                pipeline,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn storage(&self) -> &LocalStorage {
        self.inner.pipeline.storage()
    }

    pub fn ocr(&self) -> &OcrService {
        self.inner.pipeline.ocr()
    }
}
