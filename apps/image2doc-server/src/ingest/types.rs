//! Ingest types

use std::fmt;

use crate::docx::DocxError;
use crate::normalize::NormalizeError;
use crate::ocr::{OcrError, OcrProvider};
use crate::storage::StoredFile;

/// Pipeline stages, in the order a request passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    AwaitingFile,
    Normalizing,
    Recognizing,
    Assembling,
    Responding,
    Cleanup,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingFile => "awaiting_file",
            Self::Normalizing => "normalizing",
            Self::Recognizing => "recognizing",
            Self::Assembling => "assembling",
            Self::Responding => "responding",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single uploaded image
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub data: Vec<u8>,
    /// Extension from the upload's file name or content type
    pub extension: String,
    /// Title stored in the document properties
    pub title: Option<String>,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub text: String,
    pub document: StoredFile,
    pub provider: OcrProvider,
    pub paragraphs: usize,
}

/// Ingest error types
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("Document assembly failed: {0}")]
    Assembly(#[from] DocxError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Failed to record document: {0}")]
    Database(String),
}

impl IngestError {
    /// Stage the error surfaced in
    pub fn stage(&self) -> IngestStage {
        match self {
            Self::NoFile => IngestStage::AwaitingFile,
            Self::Normalize(_) => IngestStage::Normalizing,
            Self::Ocr(_) => IngestStage::Recognizing,
            Self::Assembly(_) | Self::Filesystem(_) => IngestStage::Assembling,
            Self::Database(_) => IngestStage::Responding,
        }
    }
}
