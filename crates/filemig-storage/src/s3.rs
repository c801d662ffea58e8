use async_trait::async_trait;
use bytes::Bytes;
use filemig_core::BackendKind;
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use tokio_util::io::StreamReader;

use crate::traits::{validate_key, ByteReader, Storage, StorageError, StorageIdentity, StorageResult};

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    prefix: String,
    identity: StorageIdentity,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Key prefix inside the bucket ("" for the bucket root)
    /// * `region` - AWS region; falls back to the environment when `None`
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible
    ///   providers (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        prefix: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());

        if let Some(ref region) = region {
            builder = builder.with_region(region.clone());
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let identity = StorageIdentity::new(identity_uri(&bucket, &prefix, endpoint_url.as_deref()));

        Ok(S3Storage {
            store,
            bucket,
            prefix,
            identity,
        })
    }

    fn location(&self, key: &str) -> StorageResult<Path> {
        validate_key(key)?;
        Ok(Path::from(join_prefix(&self.prefix, key)))
    }
}

/// Full object key under the configured prefix.
fn join_prefix(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), key)
    }
}

/// Canonical identity for an S3 location: endpoint + bucket + prefix.
/// Region is deliberately excluded; it selects a route, not a location.
fn identity_uri(bucket: &str, prefix: &str, endpoint: Option<&str>) -> String {
    let base = match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("s3://{}", bucket),
    };
    if prefix.is_empty() {
        base
    } else {
        format!("{}/{}", base, prefix.trim_matches('/'))
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn identity(&self) -> StorageIdentity {
        self.identity.clone()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = self.location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 head failed"
                );
                Err(StorageError::BackendError(e.to_string()))
            }
        }
    }

    async fn open_read(&self, key: &str) -> StorageResult<ByteReader> {
        let location = self.location(key)?;

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 get failed"
                );
                StorageError::ReadFailed(other.to_string())
            }
        })?;

        let stream = result.into_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }

    async fn save(&self, key: &str, mut reader: ByteReader) -> StorageResult<u64> {
        let location = self.location(key)?;
        let start = std::time::Instant::now();

        // Read the entire stream into memory and upload in a single put; the
        // put is atomic from the bucket's perspective.
        let mut buffer = Vec::new();
        let mut temp_buf = vec![0u8; 8192];

        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut reader, &mut temp_buf)
                .await
                .map_err(|e| {
                    StorageError::WriteFailed(format!("Failed to read from stream: {}", e))
                })?;

            if bytes_read == 0 {
                break;
            }

            buffer.extend_from_slice(&temp_buf[..bytes_read]);
        }

        let size = buffer.len() as u64;
        let bytes = Bytes::from(buffer);

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 save failed"
            );
            StorageError::WriteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 save successful"
        );

        Ok(size)
    }
}
