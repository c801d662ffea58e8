//! Error types module
//!
//! All engine-level errors are unified under the `MigrateError` enum. Storage
//! I/O errors stay in the filemig-storage crate; they never bubble out of a
//! migration run as errors, only as `Failed` decisions in the report.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let err: MigrateError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, MigrateError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_config_error_message() {
        let err = MigrateError::Config("OLD_STORAGE_URL not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: OLD_STORAGE_URL not set"
        );
    }
}
