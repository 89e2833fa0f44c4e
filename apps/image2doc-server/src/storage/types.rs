//! Storage types

use std::path::PathBuf;

/// A generated document persisted to the output directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// File name relative to the output directory, e.g. "1718000000000.docx"
    pub file_name: String,
    /// Absolute or working-directory-relative path on disk
    pub path: PathBuf,
    /// Public download URL
    pub url: String,
    pub size: usize,
}

/// An uploaded image staged on disk for the duration of one request
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub path: PathBuf,
    /// Lower-cased extension without the dot
    pub extension: String,
    pub size: usize,
}
