//! OCR Module
//!
//! Text recognition behind a single capability interface.
//!
//! Supports multiple backends, selected by configuration:
//! - Tesseract (local binary, flat text only)
//! - Cloud document text detection (structured page/block/paragraph/word layout)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use image2doc_server::ocr::OcrService;
//!
//! let service = OcrService::from_config(&config.ocr)?;
//! let result = service.recognize(&jpeg_bytes).await?;
//! println!("{}", result.text);
//! ```

mod provider;
mod service;
mod types;

pub use provider::{language_hints, CloudVisionProvider, OcrProviderTrait, TesseractProvider};
#[cfg(test)]
pub use provider::MockProvider;
pub use service::{OcrService, OcrServiceConfig};
pub use types::{
    LayoutBlock, LayoutPage, LayoutParagraph, LayoutSymbol, LayoutWord, OcrError, OcrProvider,
    OcrResult, TextLayout, TextStyle,
};
