//! Filemig Engine Library
//!
//! The migration engine proper: resolves source/destination backends per
//! file-bearing attribute, enumerates file references from a record source,
//! decides skip/copy/overwrite per key, and aggregates a per-label report.
//!
//! Record enumeration and storage backends are collaborators behind the
//! [`RecordSource`] and `filemig_storage::Storage` traits; the engine only
//! orchestrates calls against them.

pub mod copier;
pub mod enumerate;
pub mod orchestrator;
pub mod resolver;
pub mod source;

// Re-export commonly used types
pub use copier::CopyEngine;
pub use enumerate::enumerate_references;
pub use orchestrator::Migrator;
pub use resolver::{BackendBinding, BackendResolver, Direction};
pub use source::{ManifestSource, RecordSource};
