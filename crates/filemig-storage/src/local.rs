use std::path::{Path, PathBuf};

use async_trait::async_trait;
use filemig_core::BackendKind;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{validate_key, ByteReader, Storage, StorageError, StorageIdentity, StorageResult};

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    identity: StorageIdentity,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`.
    ///
    /// The directory is created if it does not exist. The identity is derived
    /// from the canonicalized root, so two instances over one directory
    /// compare as the same backend regardless of how the path was spelled.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let canonical = base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to canonicalize storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        let identity = StorageIdentity::new(format!("file://{}", canonical.display()));

        Ok(LocalStorage {
            base_path: canonical,
            identity,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting traversal.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Sibling temp path for in-progress writes.
    fn part_path(path: &Path) -> PathBuf {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.part", file_name))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn identity(&self) -> StorageIdentity {
        self.identity.clone()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn open_read(&self, key: &str) -> StorageResult<ByteReader> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        Ok(Box::pin(file))
    }

    async fn save(&self, key: &str, mut reader: ByteReader) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        // Write to a temp file and rename so the destination never observes a
        // partially written object.
        let part = Self::part_path(&path);

        let result: StorageResult<u64> = async {
            let mut file = fs::File::create(&part).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    part.display(),
                    e
                ))
            })?;

            let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write stream to file {}: {}",
                    part.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to flush file {}: {}", part.display(), e))
            })?;
            file.sync_all().await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to sync file {}: {}", part.display(), e))
            })?;
            drop(file);

            fs::rename(&part, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move {} into place: {}",
                    part.display(),
                    e
                ))
            })?;

            Ok(bytes_copied)
        }
        .await;

        match result {
            Ok(bytes_copied) => {
                tracing::info!(
                    path = %path.display(),
                    key = %key,
                    size_bytes = bytes_copied,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage save successful"
                );
                Ok(bytes_copied)
            }
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}
