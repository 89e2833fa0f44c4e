//! Image normalization
//!
//! Converts non-preferred formats (HEIC, PNG, TIFF, GIF, ...) to baseline
//! JPEG and downscales anything over the size threshold before OCR.

mod normalizer;
mod types;

pub use normalizer::{encode_jpeg, normalize_blocking, ImageNormalizer};
pub use types::{NormalizeConfig, NormalizeError, NormalizedImage, MIN_REDUCED_WIDTH};
