//! Record source collaborator seam.
//!
//! The engine never talks to a data store directly; it consumes records
//! through [`RecordSource`]. [`ManifestSource`] is the bundled implementation:
//! a JSON manifest declaring each record type's file-bearing attributes and
//! record instances, standing in for ORM-backed enumeration.
//!
//! Manifest format:
//!
//! ```json
//! {
//!   "gallery.Photo": {
//!     "file_attributes": ["image", "thumbnails"],
//!     "records": [
//!       {"id": "1", "fields": {"image": "a.jpg", "thumbnails": ["p1.png", "p2.png"]}}
//!     ]
//!   }
//! }
//! ```
//!
//! A field set to `null`, `""`, or omitted entirely means "no file set".

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use filemig_core::models::split_label;
use filemig_core::{FieldValue, MigrateError, MigrateResult, Record, RecordType};

/// Provides record types and their stored instances.
///
/// `records` is re-invoked for every enumeration pass, so iterating twice
/// re-queries the underlying store. Enumeration is not resumable mid-stream
/// across process restarts.
pub trait RecordSource: Send + Sync {
    /// Look up a record type by its `app_name.ModelName` label.
    fn record_type(&self, label: &str) -> Option<RecordType>;

    /// All stored instances of the record type, in store order.
    fn records(&self, label: &str) -> MigrateResult<Vec<Record>>;
}

#[derive(Debug, Deserialize)]
struct ManifestType {
    file_attributes: Vec<String>,
    #[serde(default)]
    records: Vec<ManifestRecord>,
}

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    id: String,
    #[serde(default)]
    fields: BTreeMap<String, Option<RawFieldValue>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawFieldValue {
    Many(Vec<String>),
    One(String),
}

fn field_value(raw: Option<RawFieldValue>) -> FieldValue {
    match raw {
        None => FieldValue::Empty,
        Some(RawFieldValue::One(key)) if key.is_empty() => FieldValue::Empty,
        Some(RawFieldValue::One(key)) => FieldValue::Single(key),
        Some(RawFieldValue::Many(keys)) => FieldValue::Multi(keys),
    }
}

/// Record source backed by a JSON manifest file.
pub struct ManifestSource {
    types: BTreeMap<String, ManifestType>,
}

impl ManifestSource {
    pub fn from_path(path: impl AsRef<Path>) -> MigrateResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&raw)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(raw: &str) -> MigrateResult<Self> {
        let types: BTreeMap<String, ManifestType> = serde_json::from_str(raw)?;

        for (label, manifest_type) in &types {
            split_label(label)
                .map_err(|_| MigrateError::Manifest(format!("invalid label {:?}", label)))?;
            if manifest_type.file_attributes.is_empty() {
                tracing::warn!(label = %label, "manifest declares no file-bearing attributes");
            }
        }

        Ok(ManifestSource { types })
    }
}

impl RecordSource for ManifestSource {
    fn record_type(&self, label: &str) -> Option<RecordType> {
        self.types.get(label).map(|t| RecordType {
            name: label.to_string(),
            file_attributes: t.file_attributes.clone(),
        })
    }

    fn records(&self, label: &str) -> MigrateResult<Vec<Record>> {
        let manifest_type = self
            .types
            .get(label)
            .ok_or_else(|| MigrateError::ModelNotFound(label.to_string()))?;

        Ok(manifest_type
            .records
            .iter()
            .map(|r| Record {
                id: r.id.clone(),
                fields: r
                    .fields
                    .iter()
                    .map(|(name, raw)| (name.clone(), field_value(raw.clone())))
                    .collect(),
            })
            .collect())
    }
}
