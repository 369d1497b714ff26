//! # Document Storage
//!
//! Where rendered receipts go after the caller has the bytes.
//!
//! ```text
//! generate()
//!   ├── LocalCopy:  <output_dir>/receipt_<n>.pdf           (optional)
//!   └── CloudCopy:  storage.upload("receipts/receipt_<n>.pdf")
//!                     → "<public_base_url>/receipts/receipt_<n>.pdf"
//! ```

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
}

/// Object storage for receipt documents.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Stores `data` under `key` and returns its public URL.
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<String, StorageError>;
}

/// Filesystem-backed storage served from `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(LocalStorage {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Keys are relative paths without `..`.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let size = data.len();
        fs::write(&path, data).await?;

        debug!(key = %key, bytes = size, "Document stored");
        Ok(self.public_url(key))
    }
}

/// Writes the local download copy into `dir`, returning the file path.
pub async fn write_local_copy(
    dir: &Path,
    file_name: &str,
    data: &[u8],
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    fs::write(&path, data).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8080/files/")
            .await
            .unwrap();

        let url = storage
            .upload("receipts/receipt_1.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8080/files/receipts/receipt_1.pdf");
        assert_eq!(
            std::fs::read(dir.path().join("receipts/receipt_1.pdf")).unwrap(),
            b"%PDF-1.4"
        );
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://x").await.unwrap();

        for key in ["../outside.pdf", "/etc/passwd", ""] {
            assert!(matches!(
                storage.upload(key, vec![1]).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("receipts");

        let path = write_local_copy(&out, "receipt_1.pdf", b"pdf").await.unwrap();
        assert_eq!(path, out.join("receipt_1.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"pdf");
    }
}
