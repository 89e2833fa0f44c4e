//! OCR Types
//!
//! Defines the recognition result and the structured layout tree returned by
//! providers that understand page structure.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract OCR (local binary)
    #[default]
    Tesseract,
    /// Cloud document text detection API
    CloudVision,
}

impl OcrProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::CloudVision => "cloudvision",
        }
    }
}

impl FromStr for OcrProvider {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "cloudvision" | "cloud-vision" | "vision" => Ok(Self::CloudVision),
            other => Err(OcrError::ProviderNotAvailable(other.to_string())),
        }
    }
}

/// OCR result
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Recognized text, lines separated by newlines
    pub text: String,
    /// Confidence score (0-100), when the engine reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Provider used
    pub provider: OcrProvider,
    /// Structured layout (cloud engines only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<TextLayout>,
}

impl OcrResult {
    /// Flat-text result with no layout
    pub fn plain(text: impl Into<String>, provider: OcrProvider) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            provider,
            layout: None,
        }
    }
}

/// Page → block → paragraph → word → symbol hierarchy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextLayout {
    pub pages: Vec<LayoutPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutPage {
    pub blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutBlock {
    pub paragraphs: Vec<LayoutParagraph>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutParagraph {
    pub words: Vec<LayoutWord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutWord {
    pub symbols: Vec<LayoutSymbol>,
    #[serde(default)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSymbol {
    pub text: String,
}

/// Per-word style hints
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Font size in points
    #[serde(default)]
    pub font_size: Option<f32>,
}

impl LayoutWord {
    /// Build a word from a string, one symbol per character
    pub fn from_text(text: &str, style: TextStyle) -> Self {
        Self {
            symbols: text
                .chars()
                .map(|c| LayoutSymbol { text: c.to_string() })
                .collect(),
            style,
        }
    }

    /// Reconstruct the word from its symbols
    pub fn text(&self) -> String {
        self.symbols.iter().map(|s| s.text.as_str()).collect()
    }
}

impl TextLayout {
    /// Paragraphs in reading order across all pages and blocks
    pub fn paragraphs(&self) -> impl Iterator<Item = &LayoutParagraph> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .flat_map(|block| block.paragraphs.iter())
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("OCR timed out after {0} seconds")]
    Timeout(u64),
}
