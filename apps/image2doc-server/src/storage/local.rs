//! Local filesystem storage
//!
//! Uploaded images are staged under the upload directory; generated
//! documents are written once under the output directory and served back
//! through `/files`.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::temp::TempFiles;
use super::types::{StagedUpload, StoredFile};
use crate::config::StorageConfig;

/// Give up on timestamp collisions after this many suffixed attempts
const MAX_NAME_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig, public_base_url: &str) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create both directories if they are missing
    pub async fn init(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write uploaded bytes to a unique file in the upload directory.
    ///
    /// The path is registered with `temps` before the first byte is written.
    pub async fn stage_upload(
        &self,
        data: &[u8],
        extension: &str,
        temps: &TempFiles,
    ) -> std::io::Result<StagedUpload> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        let file_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), extension);
        let path = self.upload_dir.join(file_name);

        temps.track(&path);
        tokio::fs::write(&path, data).await?;

        Ok(StagedUpload {
            path,
            extension,
            size: data.len(),
        })
    }

    /// Persist a generated `.docx`, named by the current timestamp
    pub async fn save_document(&self, data: Vec<u8>) -> std::io::Result<StoredFile> {
        let output_dir = self.output_dir.clone();
        let stamp = Utc::now().timestamp_millis();
        let size = data.len();

        let (file_name, path) = tokio::task::spawn_blocking(move || {
            write_new_file(&output_dir, stamp, "docx", &data)
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(StoredFile {
            url: self.document_url(&file_name),
            file_name,
            path,
            size,
        })
    }

    pub fn document_url(&self, file_name: &str) -> String {
        format!("{}/files/{}", self.public_base_url, file_name)
    }

    /// Map a request path onto the output directory, refusing anything that
    /// could escape it
    pub fn resolve_document(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let mut has_component = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_component = true,
                Component::CurDir => {}
                _ => return None,
            }
        }
        has_component.then(|| self.output_dir.join(relative))
    }

    pub async fn remove_document(&self, file_name: &str) -> std::io::Result<()> {
        let path = self.resolve_document(file_name).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid document path")
        })?;
        tokio::fs::remove_file(path).await
    }
}

/// Create `<stamp>.<ext>`, or `<stamp>-<n>.<ext>` when that name is taken
fn write_new_file(dir: &Path, stamp: i64, ext: &str, data: &[u8]) -> std::io::Result<(String, PathBuf)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let file_name = match attempt {
            0 => format!("{}.{}", stamp, ext),
            n => format!("{}-{}.{}", stamp, n, ext),
        };
        let path = dir.join(&file_name);

        match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(data)?;
                file.sync_all()?;
                return Ok((file_name, path));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free file name for timestamp {}", stamp),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(
            &StorageConfig {
                upload_dir: dir.path().join("uploads"),
                output_dir: dir.path().join("generated"),
            },
            "http://localhost:3000/",
        )
    }

    #[tokio::test]
    async fn test_stage_upload_lowercases_extension() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.init().await.unwrap();

        let temps = TempFiles::new();
        let staged = storage.stage_upload(b"bytes", ".PNG", &temps).await.unwrap();
        assert_eq!(staged.extension, "png");
        assert_eq!(staged.size, 5);
        assert!(staged.path.starts_with(dir.path().join("uploads")));
        assert_eq!(std::fs::read(&staged.path).unwrap(), b"bytes");
        assert!(temps.is_tracked(&staged.path));
    }

    #[tokio::test]
    async fn test_failed_stage_upload_is_still_tracked() {
        let dir = TempDir::new().unwrap();
        // Upload directory never created, so the write fails
        let storage = storage(&dir);
        let temps = TempFiles::new();

        assert!(storage.stage_upload(b"bytes", "jpg", &temps).await.is_err());
        assert_eq!(temps.len(), 1);
        assert_eq!(temps.cleanup(), 0);
    }

    #[tokio::test]
    async fn test_save_document_names_by_timestamp() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.init().await.unwrap();

        let stored = storage.save_document(b"PK\x03\x04".to_vec()).await.unwrap();
        assert!(stored.file_name.ends_with(".docx"));
        assert!(stored
            .file_name
            .trim_end_matches(".docx")
            .split('-')
            .next()
            .unwrap()
            .parse::<i64>()
            .is_ok());
        assert_eq!(stored.url, format!("http://localhost:3000/files/{}", stored.file_name));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn test_timestamp_collision_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let (first, _) = write_new_file(dir.path(), 42, "docx", b"a").unwrap();
        let (second, _) = write_new_file(dir.path(), 42, "docx", b"b").unwrap();
        assert_eq!(first, "42.docx");
        assert_eq!(second, "42-1.docx");
        assert_eq!(std::fs::read(dir.path().join("42.docx")).unwrap(), b"a");
    }

    #[test]
    fn test_resolve_document_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        assert!(storage.resolve_document("123.docx").is_some());
        assert!(storage.resolve_document("../secret").is_none());
        assert!(storage.resolve_document("/etc/passwd").is_none());
        assert!(storage.resolve_document("a/../../b").is_none());
        assert!(storage.resolve_document("").is_none());
    }
}
