//! OCR Service
//!
//! Owns the configured provider and the deployment-wide recognition settings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::{
    provider::{CloudVisionProvider, OcrProviderTrait, TesseractProvider},
    types::{OcrError, OcrProvider, OcrResult},
};
use crate::config::OcrConfig;

/// OCR service configuration
#[derive(Debug, Clone)]
pub struct OcrServiceConfig {
    /// Language hint passed to every recognition
    pub language: String,
    /// Upper bound on a single recognition
    pub timeout: Duration,
    /// Maximum recognitions in flight at once
    pub max_concurrent: usize,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            language: "eng+ell".to_string(),
            timeout: Duration::from_secs(120),
            max_concurrent: 4,
        }
    }
}

impl From<&OcrConfig> for OcrServiceConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            timeout: config.timeout(),
            max_concurrent: config.max_concurrent,
        }
    }
}

/// OCR service wrapping a single selected provider
#[derive(Clone)]
pub struct OcrService {
    config: OcrServiceConfig,
    provider: Arc<dyn OcrProviderTrait>,
    permits: Arc<Semaphore>,
}

impl OcrService {
    /// Build the service for the provider named in configuration
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let provider: Arc<dyn OcrProviderTrait> = match config.provider {
            OcrProvider::Tesseract => Arc::new(TesseractProvider::new(&config.tesseract_path)),
            OcrProvider::CloudVision => {
                let api_key = config.cloud_vision_api_key.as_deref().ok_or_else(|| {
                    OcrError::ProviderNotAvailable(
                        "cloudvision selected but CLOUD_VISION_API_KEY is not set".to_string(),
                    )
                })?;
                Arc::new(CloudVisionProvider::new(&config.cloud_vision_endpoint, api_key))
            }
        };

        Ok(Self::with_provider(provider, config.into()))
    }

    /// Build the service around an explicit provider
    pub fn with_provider(provider: Arc<dyn OcrProviderTrait>, config: OcrServiceConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            config,
            provider,
            permits,
        }
    }

    pub fn provider_type(&self) -> OcrProvider {
        self.provider.provider_type()
    }

    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Run recognition on normalized image bytes
    pub async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OcrError::ProviderNotAvailable("OCR service is shutting down".to_string()))?;

        tracing::debug!(
            provider = self.provider.provider_type().as_str(),
            language = %self.config.language,
            bytes = image_data.len(),
            "Starting recognition"
        );

        match tokio::time::timeout(
            self.config.timeout,
            self.provider.recognize(image_data, &self.config.language),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout(self.config.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::MockProvider;
    use async_trait::async_trait;

    struct SlowProvider;

    #[async_trait]
    impl OcrProviderTrait for SlowProvider {
        fn provider_type(&self) -> OcrProvider {
            OcrProvider::Tesseract
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn recognize(&self, _image_data: &[u8], _language: &str) -> Result<OcrResult, OcrError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(OcrResult::plain("late", OcrProvider::Tesseract))
        }
    }

    #[tokio::test]
    async fn test_recognize_delegates_to_provider() {
        let provider = MockProvider {
            response: Ok(OcrResult::plain("HELLO", OcrProvider::Tesseract)),
            available: true,
        };
        let service = OcrService::with_provider(Arc::new(provider), OcrServiceConfig::default());

        let result = service.recognize(b"jpeg").await.unwrap();
        assert_eq!(result.text, "HELLO");
        assert!(service.is_available().await);
        assert_eq!(service.language(), "eng+ell");
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_retried() {
        let provider = MockProvider {
            response: Err("engine crashed".to_string()),
            available: true,
        };
        let service = OcrService::with_provider(Arc::new(provider), OcrServiceConfig::default());

        let err = service.recognize(b"jpeg").await.unwrap_err();
        assert!(matches!(err, OcrError::ProcessingError(_)));
    }

    #[tokio::test]
    async fn test_recognize_times_out() {
        let config = OcrServiceConfig {
            timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let service = OcrService::with_provider(Arc::new(SlowProvider), config);

        let err = service.recognize(b"jpeg").await.unwrap_err();
        assert!(matches!(err, OcrError::Timeout(_)));
    }

    #[test]
    fn test_cloud_provider_requires_key() {
        let config = OcrConfig {
            provider: OcrProvider::CloudVision,
            cloud_vision_api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            OcrService::from_config(&config),
            Err(OcrError::ProviderNotAvailable(_))
        ));
    }

    #[test]
    fn test_from_config_selects_provider() {
        let config = OcrConfig {
            provider: OcrProvider::CloudVision,
            cloud_vision_api_key: Some("key".to_string()),
            ..Default::default()
        };
        let service = OcrService::from_config(&config).unwrap();
        assert_eq!(service.provider_type(), OcrProvider::CloudVision);

        let service = OcrService::from_config(&OcrConfig::default()).unwrap();
        assert_eq!(service.provider_type(), OcrProvider::Tesseract);
    }
}
