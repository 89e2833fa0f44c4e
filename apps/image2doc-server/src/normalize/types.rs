//! Normalization types

use serde::Deserialize;
use std::path::PathBuf;

/// Never shrink below this width while chasing the size threshold
pub const MIN_REDUCED_WIDTH: u32 = 320;

/// Image normalization settings
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    /// Largest file handed to the OCR engine
    pub max_bytes: u64,
    /// JPEG quality used for every re-encode (1-100)
    pub jpeg_quality: u8,
    /// Width to downscale to when the file is over `max_bytes`
    pub reduced_width: u32,
    /// Convert to 8-bit grayscale before encoding
    pub grayscale: bool,
    /// Extensions that are always re-encoded (lower-case, no dot)
    pub convert_extensions: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_bytes: 4 * 1024 * 1024,
            jpeg_quality: 95,
            reduced_width: 2000,
            grayscale: false,
            convert_extensions: ["heic", "heif", "png", "tif", "tiff", "gif", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NormalizeConfig {
    pub fn converts_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.convert_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Result of normalization
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// File to hand to the OCR engine
    pub path: PathBuf,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Re-encoded to JPEG (false when the input passed through untouched)
    pub converted: bool,
    /// Downscaled to fit `max_bytes`
    pub resized: bool,
}

/// Normalization error types
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image still {size} bytes at minimum width (limit {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Normalization task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_extension() {
        let config = NormalizeConfig::default();
        assert!(config.converts_extension("heic"));
        assert!(config.converts_extension(".PNG"));
        assert!(!config.converts_extension("jpg"));
        assert!(!config.converts_extension("jpeg"));
    }
}
