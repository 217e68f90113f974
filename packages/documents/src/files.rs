//! Binary payload storage seam.
//!
//! The registry hands a byte stream and the original filename to this
//! collaborator and gets back a stable storage path and size. Filename
//! sanitization is this layer's job; the registry never trusts client
//! names for paths.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use tandem_core::generate_id;

#[derive(Error, Debug)]
pub enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored payload: where it lives and how big it is.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub size: i64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist a payload, returning its stable path and byte size.
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, FileStoreError>;

    /// Remove a previously stored payload by its path.
    async fn remove(&self, path: &str) -> Result<(), FileStoreError>;
}

/// Local-disk file store. Files land under a single directory with a
/// generated name; only the extension survives from the original filename.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn safe_extension(original_name: &str) -> Option<String> {
        let ext = Path::new(original_name).extension()?.to_str()?;
        if ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(ext.to_ascii_lowercase())
        } else {
            None
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, FileStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = match Self::safe_extension(original_name) {
            Some(ext) => format!("{}.{}", generate_id(), ext),
            None => generate_id(),
        };

        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as i64,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), FileStoreError> {
        tokio::fs::remove_file(path).await?;
        debug!("Removed stored file {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        let stored = store.store("report.pdf", b"file-bytes").await.unwrap();
        assert_eq!(stored.size, 10);
        assert!(stored.path.ends_with(".pdf"));

        let on_disk = tokio::fs::read(&stored.path).await.unwrap();
        assert_eq!(on_disk, b"file-bytes");

        store.remove(&stored.path).await.unwrap();
        assert!(tokio::fs::metadata(&stored.path).await.is_err());
    }

    #[tokio::test]
    async fn test_hostile_filename_does_not_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        let stored = store
            .store("../../etc/passwd", b"nope")
            .await
            .unwrap();

        let canonical = std::fs::canonicalize(&stored.path).unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        assert!(canonical.starts_with(&root));
    }

    #[tokio::test]
    async fn test_remove_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        let missing = dir.path().join("never-existed");
        assert!(store.remove(missing.to_str().unwrap()).await.is_err());
    }
}
