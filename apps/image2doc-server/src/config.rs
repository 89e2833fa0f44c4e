//! Configuration management for the Image2Doc server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::docx::StyleRules;
use crate::normalize::NormalizeConfig;
use crate::ocr::OcrProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub ocr: OcrConfig,
    pub normalize: NormalizeConfig,
    pub assembly: StyleRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when building `docxUrl` links
    pub public_base_url: String,
    /// Request body limit for `/ocr`
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Where uploaded images live while a request is in flight
    pub upload_dir: PathBuf,
    /// Where generated `.docx` files are written and served from
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub provider: OcrProvider,
    /// Tesseract-style language string, fixed per deployment (e.g. "eng+ell")
    pub language: String,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    pub tesseract_path: String,
    pub cloud_vision_endpoint: String,
    pub cloud_vision_api_key: Option<String>,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: OcrProvider::Tesseract,
            language: "eng+ell".to_string(),
            timeout_secs: 120,
            max_concurrent: 4,
            tesseract_path: "tesseract".to_string(),
            cloud_vision_endpoint: "https://vision.googleapis.com".to_string(),
            cloud_vision_api_key: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                public_base_url: "http://localhost:3000".to_string(),
                max_upload_bytes: 25 * 1024 * 1024,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("generated"),
            },
            database: DatabaseConfig {
                url: "sqlite:./image2doc.db".to_string(),
            },
            ocr: OcrConfig::default(),
            normalize: NormalizeConfig::default(),
            assembly: StyleRules::default(),
        }
    }
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown OCR provider: {0}")]
    UnknownProvider(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port: u16 = parse_var("SERVER_PORT", defaults.server.port)?;
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let provider = match env::var("OCR_PROVIDER") {
            Ok(value) => value
                .parse::<OcrProvider>()
                .map_err(|_| ConfigError::UnknownProvider(value))?,
            Err(_) => defaults.ocr.provider,
        };

        let convert_extensions = match env::var("NORMALIZE_CONVERT_EXTENSIONS") {
            Ok(list) => list
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            Err(_) => defaults.normalize.convert_extensions.clone(),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                output_dir: env::var("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.output_dir),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            ocr: OcrConfig {
                provider,
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                timeout_secs: parse_var("OCR_TIMEOUT_SECS", defaults.ocr.timeout_secs)?,
                max_concurrent: parse_var("OCR_MAX_CONCURRENT", defaults.ocr.max_concurrent)?,
                tesseract_path: env::var("TESSERACT_PATH").unwrap_or(defaults.ocr.tesseract_path),
                cloud_vision_endpoint: env::var("CLOUD_VISION_ENDPOINT")
                    .unwrap_or(defaults.ocr.cloud_vision_endpoint),
                cloud_vision_api_key: env::var("CLOUD_VISION_API_KEY").ok(),
            },
            normalize: NormalizeConfig {
                max_bytes: parse_var("NORMALIZE_MAX_BYTES", defaults.normalize.max_bytes)?,
                jpeg_quality: parse_var("NORMALIZE_QUALITY", defaults.normalize.jpeg_quality)?,
                reduced_width: parse_var("NORMALIZE_REDUCED_WIDTH", defaults.normalize.reduced_width)?,
                grayscale: parse_var("NORMALIZE_GRAYSCALE", defaults.normalize.grayscale)?,
                convert_extensions,
            },
            assembly: StyleRules {
                bold_uppercase_lines: parse_var(
                    "ASSEMBLY_BOLD_UPPERCASE",
                    defaults.assembly.bold_uppercase_lines,
                )?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ocr.language, "eng+ell");
        assert_eq!(config.ocr.provider, OcrProvider::Tesseract);
        assert!(config.assembly.bold_uppercase_lines);
        assert!(config.normalize.convert_extensions.iter().any(|e| e == "heic"));
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("IMAGE2DOC_TEST_PORT", "not-a-port");
        let result: Result<u16, _> = parse_var("IMAGE2DOC_TEST_PORT", 3000);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        std::env::remove_var("IMAGE2DOC_TEST_PORT");
    }

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let result: u64 = parse_var("IMAGE2DOC_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(result, 42);
    }
}
