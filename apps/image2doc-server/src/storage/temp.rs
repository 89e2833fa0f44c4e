//! Request-scoped temporary files
//!
//! Everything registered here is unlinked when the last handle is dropped,
//! whichever way the request ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct TempFiles {
    inner: Arc<TempFilesInner>,
}

#[derive(Default)]
struct TempFilesInner {
    paths: Mutex<Vec<PathBuf>>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for removal. Registering a path that never gets
    /// created is harmless.
    pub fn track(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut paths = self.inner.paths.lock();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.inner.paths.lock().iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.inner.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every tracked file now. Returns how many were deleted.
    pub fn cleanup(&self) -> usize {
        self.inner.cleanup()
    }
}

impl TempFilesInner {
    fn cleanup(&self) -> usize {
        let paths: Vec<PathBuf> = std::mem::take(&mut *self.paths.lock());
        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to remove temp file: {}", e);
                }
            }
        }
        removed
    }
}

// Runs once, when the last clone goes away
impl Drop for TempFilesInner {
    fn drop(&mut self) {
        self.cleanup();
    }
}
