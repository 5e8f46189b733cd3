use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::errors::InternalError;
use crate::errors::internal::StorageError;

/// Blob storage for user-owned files such as avatars
///
/// Paths are relative keys like `avatars/<user>-<uuid>.png`.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), InternalError>;

    /// Remove a file; removing an absent file succeeds
    async fn delete(&self, path: &str) -> Result<(), InternalError>;

    async fn exists(&self, path: &str) -> Result<bool, InternalError>;
}

/// Stores files under a local root directory
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative key onto the root, refusing anything that could escape it
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn io_error(operation: &'static str, path: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            operation,
            path: path.to_string(),
            source,
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), InternalError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error("create_dir", path, e))?;
        }
        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|e| Self::io_error("write", path, e))?;
        tracing::debug!("Stored file {}", path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), InternalError> {
        let full_path = self.resolve(path)?;
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted file {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("delete", path, e).into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, InternalError> {
        let full_path = self.resolve(path)?;
        tokio::fs::try_exists(&full_path)
            .await
            .map_err(|e| Self::io_error("exists", path, e).into())
    }
}
