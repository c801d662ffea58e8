//! Copy engine.
//!
//! For each file reference the engine applies a fixed decision procedure, in
//! order: empty key, same backend, missing source, exists without overwrite,
//! then the actual transfer. I/O failures and timeouts become `Failed`
//! decisions with the cause captured; they never abort the rest of the run.

use std::time::Duration;

use filemig_core::{CopyDecision, FileReference};
use filemig_storage::{Storage, StorageResult};

pub struct CopyEngine {
    pub overwrite: bool,
    pub timeout: Duration,
}

impl CopyEngine {
    pub fn new(overwrite: bool, timeout: Duration) -> Self {
        CopyEngine { overwrite, timeout }
    }

    /// Decide and, if warranted, execute the transfer for one reference.
    ///
    /// `position`/`total` are only reported in the per-key progress log.
    pub async fn process(
        &self,
        reference: &FileReference,
        source: &dyn Storage,
        destination: &dyn Storage,
        position: usize,
        total: usize,
    ) -> CopyDecision {
        let key = reference.key.as_str();

        if key.is_empty() {
            tracing::info!(
                position,
                total,
                record = %reference.record_id,
                attribute = %reference.attribute,
                "field is empty, ignoring file"
            );
            return CopyDecision::SkippedEmpty;
        }

        if source.identity() == destination.identity() {
            tracing::info!(
                position,
                total,
                key = %key,
                backend = %source.identity(),
                "same storage backend, ignoring file"
            );
            return CopyDecision::SkippedSameBackend;
        }

        let source_exists = match source.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::info!(position, total, key = %key, "processing file");
                return CopyDecision::Failed(format!("source existence check: {}", e));
            }
        };
        let destination_exists = match destination.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::info!(position, total, key = %key, source_exists, "processing file");
                return CopyDecision::Failed(format!("destination existence check: {}", e));
            }
        };

        tracing::info!(
            position,
            total,
            key = %key,
            source_exists,
            destination_exists,
            "processing file"
        );

        if !source_exists {
            tracing::info!(key = %key, "file doesn't exist in source storage, ignoring file");
            return CopyDecision::SkippedMissingSource;
        }

        if !self.overwrite && destination_exists {
            tracing::info!(key = %key, "file already exists in destination storage, ignoring file");
            return CopyDecision::SkippedExistsNoOverwrite;
        }

        match tokio::time::timeout(self.timeout, transfer(source, destination, key)).await {
            Err(_) => CopyDecision::Failed(format!(
                "copy timed out after {}s",
                self.timeout.as_secs()
            )),
            Ok(Err(e)) => CopyDecision::Failed(e.to_string()),
            Ok(Ok(bytes)) => {
                tracing::info!(key = %key, size_bytes = bytes, "copied file to destination storage");
                CopyDecision::Copied
            }
        }
    }
}

async fn transfer(source: &dyn Storage, destination: &dyn Storage, key: &str) -> StorageResult<u64> {
    let reader = source.open_read(key).await?;
    destination.save(key, reader).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use filemig_core::BackendKind;
    use filemig_storage::{ByteReader, LocalStorage, StorageError, StorageIdentity};
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    /// Source whose reads never complete, for exercising the copy timeout.
    struct StallingSource;

    #[async_trait::async_trait]
    impl Storage for StallingSource {
        fn identity(&self) -> StorageIdentity {
            StorageIdentity::new("file:///stalled")
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(true)
        }

        async fn open_read(&self, _key: &str) -> StorageResult<ByteReader> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Box::pin(std::io::Cursor::new(Vec::new())))
        }

        async fn save(&self, _key: &str, _reader: ByteReader) -> StorageResult<u64> {
            Ok(0)
        }
    }

    /// Backend whose existence checks always error.
    struct UnreachableBackend;

    #[async_trait::async_trait]
    impl Storage for UnreachableBackend {
        fn identity(&self) -> StorageIdentity {
            StorageIdentity::new("s3://unreachable/media")
        }

        fn kind(&self) -> BackendKind {
            BackendKind::S3
        }

        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::BackendError("connection reset".to_string()))
        }

        async fn open_read(&self, _key: &str) -> StorageResult<ByteReader> {
            Err(StorageError::BackendError("connection reset".to_string()))
        }

        async fn save(&self, _key: &str, _reader: ByteReader) -> StorageResult<u64> {
            Err(StorageError::BackendError("connection reset".to_string()))
        }
    }

    fn engine(overwrite: bool) -> CopyEngine {
        CopyEngine::new(overwrite, Duration::from_secs(30))
    }

    fn reference(key: &str) -> FileReference {
        FileReference::new("1", "image", key)
    }

    async fn put(storage: &LocalStorage, key: &str, data: &[u8]) {
        let reader: ByteReader = Box::pin(std::io::Cursor::new(data.to_vec()));
        storage.save(key, reader).await.unwrap();
    }

    async fn get(storage: &LocalStorage, key: &str) -> Vec<u8> {
        let mut reader = storage.open_read(key).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    async fn pair() -> (tempfile::TempDir, LocalStorage, tempfile::TempDir, LocalStorage) {
        let src_dir = tempdir().unwrap();
        let dst_dir = tempdir().unwrap();
        let src = LocalStorage::new(src_dir.path()).await.unwrap();
        let dst = LocalStorage::new(dst_dir.path()).await.unwrap();
        (src_dir, src, dst_dir, dst)
    }

    #[tokio::test]
    async fn test_empty_key_short_circuits() {
        let (_s, src, _d, dst) = pair().await;
        let decision = engine(false).process(&reference(""), &src, &dst, 1, 1).await;
        assert_eq!(decision, CopyDecision::SkippedEmpty);
    }

    #[tokio::test]
    async fn test_same_backend_is_noop_even_with_overwrite() {
        let dir = tempdir().unwrap();
        let a = LocalStorage::new(dir.path()).await.unwrap();
        let b = LocalStorage::new(dir.path()).await.unwrap();
        put(&a, "a.jpg", b"bytes").await;

        let decision = engine(true).process(&reference("a.jpg"), &a, &b, 1, 1).await;
        assert_eq!(decision, CopyDecision::SkippedSameBackend);
    }

    #[tokio::test]
    async fn test_missing_source_never_writes_destination() {
        let (_s, src, _d, dst) = pair().await;
        let decision = engine(true)
            .process(&reference("ghost.jpg"), &src, &dst, 1, 1)
            .await;
        assert_eq!(decision, CopyDecision::SkippedMissingSource);
        assert!(!dst.exists("ghost.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_destination_without_overwrite() {
        let (_s, src, _d, dst) = pair().await;
        put(&src, "a.jpg", b"new bytes").await;
        put(&dst, "a.jpg", b"old bytes").await;

        let decision = engine(false).process(&reference("a.jpg"), &src, &dst, 1, 1).await;
        assert_eq!(decision, CopyDecision::SkippedExistsNoOverwrite);
        assert_eq!(get(&dst, "a.jpg").await, b"old bytes");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_destination_bytes() {
        let (_s, src, _d, dst) = pair().await;
        put(&src, "a.jpg", b"source bytes").await;
        put(&dst, "a.jpg", b"stale destination bytes").await;

        let decision = engine(true).process(&reference("a.jpg"), &src, &dst, 1, 1).await;
        assert_eq!(decision, CopyDecision::Copied);
        assert_eq!(get(&dst, "a.jpg").await, b"source bytes");
    }

    #[tokio::test]
    async fn test_copy_into_empty_destination() {
        let (_s, src, _d, dst) = pair().await;
        put(&src, "media/a.jpg", b"payload").await;

        let decision = engine(false)
            .process(&reference("media/a.jpg"), &src, &dst, 1, 1)
            .await;
        assert_eq!(decision, CopyDecision::Copied);
        assert_eq!(get(&dst, "media/a.jpg").await, b"payload");
    }

    #[tokio::test]
    async fn test_write_failure_becomes_failed_decision() {
        let (_s, src, dst_dir, dst) = pair().await;
        put(&src, "clash.bin", b"payload").await;
        // A directory squatting on the destination key makes the final rename fail.
        std::fs::create_dir_all(dst_dir.path().join("clash.bin")).unwrap();

        let decision = engine(true)
            .process(&reference("clash.bin"), &src, &dst, 1, 1)
            .await;
        assert!(matches!(decision, CopyDecision::Failed(_)));
    }

    #[tokio::test]
    async fn test_slow_transfer_times_out_as_failed() {
        let dir = tempdir().unwrap();
        let dst = LocalStorage::new(dir.path()).await.unwrap();
        let engine = CopyEngine::new(true, Duration::from_millis(50));

        let decision = engine
            .process(&reference("slow.bin"), &StallingSource, &dst, 1, 1)
            .await;
        match decision {
            CopyDecision::Failed(cause) => assert!(cause.contains("timed out")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(!dst.exists("slow.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_source_existence_error_becomes_failed_decision() {
        let (_d, _s, _dd, dst) = pair().await;
        let decision = engine(false)
            .process(&reference("a.jpg"), &UnreachableBackend, &dst, 1, 1)
            .await;
        match decision {
            CopyDecision::Failed(cause) => assert!(cause.contains("source existence check")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_destination_existence_error_becomes_failed_decision() {
        let (_s, src, _d, _dst) = pair().await;
        put(&src, "a.jpg", b"bytes").await;
        let decision = engine(false)
            .process(&reference("a.jpg"), &src, &UnreachableBackend, 1, 1)
            .await;
        match decision {
            CopyDecision::Failed(cause) => assert!(cause.contains("destination existence check")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
