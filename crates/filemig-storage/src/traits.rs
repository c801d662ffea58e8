//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. The migration engine only ever needs four capabilities:
//! existence check, open-for-read, save, and a comparable identity.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::pin::Pin;

use async_trait::async_trait;
use filemig_core::BackendKind;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream handed from a source backend's `open_read` to a destination
/// backend's `save`. Scoped to one transfer; dropped on both success and
/// failure paths once the transfer ends.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Canonical URI identifying a storage location.
///
/// Two handles are "the same backend" exactly when their identities compare
/// equal. Reference equality is meaningless here; the orchestrator may build
/// any number of handles for one configured location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageIdentity(String);

impl StorageIdentity {
    pub fn new(uri: impl Into<String>) -> Self {
        StorageIdentity(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StorageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Operations may fail with transient I/O errors; the abstraction does not
/// retry. Retry and timeout policy belong to the copy engine.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Canonical identity of the underlying storage location.
    fn identity(&self) -> StorageIdentity;

    /// Backend kind (local, s3).
    fn kind(&self) -> BackendKind;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Open a key for reading. Fails with `NotFound` if the key is absent.
    async fn open_read(&self, key: &str) -> StorageResult<ByteReader>;

    /// Write the reader's bytes under `key`, returning the byte count.
    ///
    /// Writes are all-or-nothing from the destination's perspective: a failed
    /// save leaves any previous object under `key` untouched.
    async fn save(&self, key: &str, reader: ByteReader) -> StorageResult<u64>;
}

/// Reject keys that could escape the backend's root.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
