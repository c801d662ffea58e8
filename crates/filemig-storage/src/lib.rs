//! Filemig Storage Library
//!
//! This crate provides the storage capability abstraction the migration
//! engine copies through, plus local filesystem and S3 implementations.
//!
//! # Backend identity
//!
//! Every backend exposes an [`StorageIdentity`], a canonical URI for the
//! underlying storage location. The engine compares identities, not handle
//! references, to detect same-backend migrations; two handles built from the
//! same configuration compare equal even though they are distinct objects.
//!
//! Keys must not contain `..` or a leading `/`; all backends validate this.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_backend;
pub use filemig_core::BackendKind;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteReader, Storage, StorageError, StorageIdentity, StorageResult};
