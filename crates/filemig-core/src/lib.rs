//! Filemig Core Library
//!
//! This crate provides the domain models, backend descriptions, configuration,
//! and error types shared across all filemig components.

pub mod backend_spec;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use backend_spec::{BackendKind, BackendSpec};
pub use config::MigrationConfig;
pub use error::{MigrateError, MigrateResult};
pub use models::{
    CopyDecision, FieldValue, FileReference, KeyOutcome, LabelResult, MigrationReport, Record,
    RecordType,
};
