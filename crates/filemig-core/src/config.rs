//! Configuration module
//!
//! Migration configuration is an explicit struct handed to the resolver and
//! orchestrator; nothing reads ambient globals after startup. `from_env`
//! gathers the process-wide defaults and the per-field override maps:
//!
//! - `OLD_STORAGE_URL` / `NEW_STORAGE_URL`: default backend URIs for the old
//!   and new side.
//! - `OLD_STORAGE_OVERRIDES` / `NEW_STORAGE_OVERRIDES`: JSON maps of
//!   `"recordtype.attribute"` to a backend URI, e.g.
//!   `{"gallery.Photo.image": "s3://assets/photos?region=us-east-1"}`.
//! - `COPY_TIMEOUT_SECS`: per-file copy timeout (default 300).
//! - `MAX_CONCURRENT_COPIES`: worker pool size (default 1, i.e. sequential).

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::backend_spec::BackendSpec;
use crate::error::{MigrateError, MigrateResult};

const DEFAULT_COPY_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_CONCURRENT_COPIES: usize = 1;

/// Process-wide migration configuration.
///
/// Either default may be absent; resolution fails per attribute only when a
/// side has neither an override nor a default.
#[derive(Clone, Debug)]
pub struct MigrationConfig {
    pub old_default: Option<BackendSpec>,
    pub new_default: Option<BackendSpec>,
    pub old_overrides: HashMap<String, BackendSpec>,
    pub new_overrides: HashMap<String, BackendSpec>,
    pub copy_timeout: Duration,
    pub max_concurrent_copies: usize,
}

impl MigrationConfig {
    pub fn from_env() -> MigrateResult<Self> {
        let old_default = parse_optional_backend("OLD_STORAGE_URL")?;
        let new_default = parse_optional_backend("NEW_STORAGE_URL")?;

        let old_overrides = match env::var("OLD_STORAGE_OVERRIDES") {
            Ok(raw) => parse_overrides(&raw)
                .map_err(|e| MigrateError::Config(format!("OLD_STORAGE_OVERRIDES: {}", e)))?,
            Err(_) => HashMap::new(),
        };
        let new_overrides = match env::var("NEW_STORAGE_OVERRIDES") {
            Ok(raw) => parse_overrides(&raw)
                .map_err(|e| MigrateError::Config(format!("NEW_STORAGE_OVERRIDES: {}", e)))?,
            Err(_) => HashMap::new(),
        };

        let copy_timeout_secs = env::var("COPY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_COPY_TIMEOUT_SECS);

        let max_concurrent_copies = env::var("MAX_CONCURRENT_COPIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CONCURRENT_COPIES)
            .max(1);

        Ok(MigrationConfig {
            old_default,
            new_default,
            old_overrides,
            new_overrides,
            copy_timeout: Duration::from_secs(copy_timeout_secs),
            max_concurrent_copies,
        })
    }

    /// Configuration with explicit defaults and no overrides. Test and embedding
    /// convenience; env parsing is bypassed entirely.
    pub fn with_defaults(old_default: BackendSpec, new_default: BackendSpec) -> Self {
        MigrationConfig {
            old_default: Some(old_default),
            new_default: Some(new_default),
            old_overrides: HashMap::new(),
            new_overrides: HashMap::new(),
            copy_timeout: Duration::from_secs(DEFAULT_COPY_TIMEOUT_SECS),
            max_concurrent_copies: DEFAULT_MAX_CONCURRENT_COPIES,
        }
    }
}

fn parse_optional_backend(var: &str) -> MigrateResult<Option<BackendSpec>> {
    match env::var(var) {
        Ok(raw) => {
            let spec = raw
                .parse::<BackendSpec>()
                .map_err(|e| MigrateError::Config(format!("{}: {}", var, e)))?;
            Ok(Some(spec))
        }
        Err(_) => Ok(None),
    }
}

/// Parse a JSON map of `"recordtype.attribute"` to backend URI.
pub fn parse_overrides(raw: &str) -> MigrateResult<HashMap<String, BackendSpec>> {
    let map: HashMap<String, String> = serde_json::from_str(raw)?;
    let mut overrides = HashMap::with_capacity(map.len());
    for (field_path, uri) in map {
        let spec = uri
            .parse::<BackendSpec>()
            .map_err(|e| MigrateError::Config(format!("{}: {}", field_path, e)))?;
        overrides.insert(field_path, spec);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_overrides() {
        let overrides = parse_overrides(
            r#"{"gallery.Photo.image": "s3://assets/photos?region=us-east-1",
                "gallery.Photo.thumbnails": "file:///var/thumbs"}"#,
        )
        .unwrap();

        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides["gallery.Photo.thumbnails"],
            BackendSpec::Local {
                root: PathBuf::from("/var/thumbs")
            }
        );
        assert!(matches!(
            overrides["gallery.Photo.image"],
            BackendSpec::S3 { .. }
        ));
    }

    #[test]
    fn test_parse_overrides_rejects_bad_uri() {
        assert!(parse_overrides(r#"{"a.B.c": "gs://nope"}"#).is_err());
    }

    #[test]
    fn test_parse_overrides_rejects_bad_json() {
        assert!(parse_overrides("not json").is_err());
    }

    #[test]
    fn test_with_defaults() {
        let config = MigrationConfig::with_defaults(
            BackendSpec::local("/old"),
            BackendSpec::local("/new"),
        );
        assert_eq!(config.max_concurrent_copies, 1);
        assert!(config.old_overrides.is_empty());
        assert_eq!(config.copy_timeout, Duration::from_secs(300));
    }
}
