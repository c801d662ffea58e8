#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageResult};
use filemig_core::BackendSpec;
use std::sync::Arc;

/// Create a storage backend handle from a parsed backend spec.
pub async fn create_backend(spec: &BackendSpec) -> StorageResult<Arc<dyn Storage>> {
    match spec {
        #[cfg(feature = "storage-local")]
        BackendSpec::Local { root } => {
            let storage = LocalStorage::new(root.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        BackendSpec::Local { .. } => Err(crate::StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        BackendSpec::S3 {
            bucket,
            prefix,
            region,
            endpoint,
        } => {
            let storage = S3Storage::new(
                bucket.clone(),
                prefix.clone(),
                region.clone(),
                endpoint.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        BackendSpec::S3 { .. } => Err(crate::StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),
    }
}
