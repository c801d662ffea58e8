//! Backend kinds and parsed backend locations.
//!
//! A [`BackendSpec`] is the comparable, side-effect-free description of a
//! storage location. Specs are parsed from URIs in configuration
//! (`file:///var/media`, `s3://bucket/prefix?region=eu-west-1`) and rendered
//! back to a canonical URI by `Display`. The canonical URI is what
//! same-backend detection compares, so two handles built from equal specs are
//! recognized as the same backend regardless of object identity.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::MigrateError;

/// Storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
}

impl FromStr for BackendKind {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            _ => Err(MigrateError::Config(format!(
                "Invalid storage backend kind: {}",
                s
            ))),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::S3 => write!(f, "s3"),
        }
    }
}

/// Parsed description of a storage backend location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendSpec {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        prefix: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
}

impl BackendSpec {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendSpec::Local { .. } => BackendKind::Local,
            BackendSpec::S3 { .. } => BackendKind::S3,
        }
    }

    /// Local backend rooted at a directory. Used by the CLI's `--path` flag.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        BackendSpec::Local { root: root.into() }
    }

    fn parse_s3(rest: &str) -> Result<Self, MigrateError> {
        let (location, query) = match rest.split_once('?') {
            Some((l, q)) => (l, Some(q)),
            None => (rest, None),
        };

        let (bucket, prefix) = match location.split_once('/') {
            Some((b, p)) => (b, p.trim_matches('/')),
            None => (location, ""),
        };

        if bucket.is_empty() {
            return Err(MigrateError::Config(
                "S3 backend URI is missing a bucket name".to_string(),
            ));
        }

        let mut region = None;
        let mut endpoint = None;
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some(("region", v)) => region = Some(v.to_string()),
                    Some(("endpoint", v)) => endpoint = Some(v.to_string()),
                    _ => {
                        return Err(MigrateError::Config(format!(
                            "Unknown S3 backend URI parameter: {}",
                            pair
                        )))
                    }
                }
            }
        }

        Ok(BackendSpec::S3 {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            region,
            endpoint,
        })
    }
}

impl FromStr for BackendSpec {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MigrateError::Config("Backend URI is empty".to_string()));
        }

        if let Some(rest) = s.strip_prefix("file://") {
            if rest.is_empty() {
                return Err(MigrateError::Config(
                    "file:// backend URI is missing a path".to_string(),
                ));
            }
            return Ok(BackendSpec::Local {
                root: PathBuf::from(rest),
            });
        }

        if let Some(rest) = s.strip_prefix("s3://") {
            return Self::parse_s3(rest);
        }

        if s.contains("://") {
            return Err(MigrateError::Config(format!(
                "Unsupported backend URI scheme: {}",
                s
            )));
        }

        // Bare paths are treated as local filesystem roots.
        Ok(BackendSpec::Local {
            root: PathBuf::from(s),
        })
    }
}

impl Display for BackendSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendSpec::Local { root } => write!(f, "file://{}", root.display()),
            BackendSpec::S3 {
                bucket,
                prefix,
                region,
                endpoint,
            } => {
                write!(f, "s3://{}", bucket)?;
                if !prefix.is_empty() {
                    write!(f, "/{}", prefix)?;
                }
                let mut params = Vec::new();
                if let Some(region) = region {
                    params.push(format!("region={}", region));
                }
                if let Some(endpoint) = endpoint {
                    params.push(format!("endpoint={}", endpoint));
                }
                if !params.is_empty() {
                    write!(f, "?{}", params.join("&"))?;
                }
                Ok(())
            }
        }
    }
}
