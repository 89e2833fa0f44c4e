//! Image normalizer
//!
//! Makes an arbitrary upload acceptable to the OCR engine: baseline JPEG,
//! no larger than the configured byte limit.

use std::path::{Path, PathBuf};

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat, ImageReader};

use super::types::{NormalizeConfig, NormalizeError, NormalizedImage, MIN_REDUCED_WIDTH};
use crate::storage::TempFiles;

/// Extensions the decoder is known not to handle
const UNDECODABLE_EXTENSIONS: &[&str] = &["heic", "heif"];

#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    config: NormalizeConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalize the image at `path` on the blocking pool.
    ///
    /// Any file written along the way is registered with `temps`.
    pub async fn normalize(
        &self,
        path: &Path,
        extension: &str,
        temps: &TempFiles,
    ) -> Result<NormalizedImage, NormalizeError> {
        let config = self.config.clone();
        let path = path.to_path_buf();
        let extension = extension.to_string();
        let temps = temps.clone();

        tokio::task::spawn_blocking(move || normalize_blocking(&config, &path, &extension, &temps))
            .await
            .map_err(|e| NormalizeError::Task(e.to_string()))?
    }
}

/// Synchronous normalization pipeline
pub fn normalize_blocking(
    config: &NormalizeConfig,
    path: &Path,
    extension: &str,
    temps: &TempFiles,
) -> Result<NormalizedImage, NormalizeError> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let size = std::fs::metadata(path)?.len();

    let reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(NormalizeError::Io)?;
    let detected = reader.format();

    let needs_conversion = config.converts_extension(&extension)
        || detected != Some(ImageFormat::Jpeg)
        || config.grayscale;

    if !needs_conversion && size <= config.max_bytes {
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?;

        tracing::debug!(path = %path.display(), size, "Image passes through unchanged");
        return Ok(NormalizedImage {
            path: path.to_path_buf(),
            size,
            width,
            height,
            converted: false,
            resized: false,
        });
    }

    if detected.is_none() {
        return Err(if UNDECODABLE_EXTENSIONS.contains(&extension.as_str()) {
            NormalizeError::UnsupportedFormat(extension)
        } else {
            NormalizeError::Decode("unrecognized image data".to_string())
        });
    }

    let decoded = reader
        .decode()
        .map_err(|e| NormalizeError::Decode(e.to_string()))?;

    // JPEG has no alpha channel
    let image = if config.grayscale {
        DynamicImage::ImageLuma8(decoded.to_luma8())
    } else {
        DynamicImage::ImageRgb8(decoded.to_rgb8())
    };

    let output_path = normalized_path(path);
    temps.track(&output_path);

    let mut bytes = encode_jpeg(&image, config.jpeg_quality)?;
    let (mut width, mut height) = (image.width(), image.height());
    let mut resized = false;

    if bytes.len() as u64 > config.max_bytes {
        let mut target = if config.reduced_width < image.width() {
            config.reduced_width
        } else {
            shrink(image.width())
        };

        loop {
            let scaled = scale_to_width(&image, target);
            bytes = encode_jpeg(&scaled, config.jpeg_quality)?;
            (width, height) = (scaled.width(), scaled.height());
            resized = true;

            tracing::debug!(width, bytes = bytes.len(), "Re-encoded at reduced width");

            if bytes.len() as u64 <= config.max_bytes {
                break;
            }
            if target <= MIN_REDUCED_WIDTH {
                return Err(NormalizeError::TooLarge {
                    size: bytes.len() as u64,
                    max: config.max_bytes,
                });
            }
            target = shrink(target);
        }
    }

    std::fs::write(&output_path, &bytes)?;

    tracing::debug!(
        input = %path.display(),
        output = %output_path.display(),
        from_bytes = size,
        to_bytes = bytes.len(),
        resized,
        "Image normalized"
    );

    Ok(NormalizedImage {
        path: output_path,
        size: bytes.len() as u64,
        width,
        height,
        converted: true,
        resized,
    })
}

/// Encode as baseline JPEG at the given quality
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    image
        .write_with_encoder(encoder)
        .map_err(|e| NormalizeError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn scale_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    if width >= image.width() {
        return image.clone();
    }
    let height = ((image.height() as u64 * width as u64) / image.width() as u64).max(1) as u32;
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Next width to try: three quarters, floored at the minimum
fn shrink(width: u32) -> u32 {
    (width.saturating_mul(3) / 4).max(MIN_REDUCED_WIDTH).min(width)
}

fn normalized_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    path.with_file_name(format!("{}-normalized.jpg", stem))
}
