//! Record and file reference models.
//!
//! Records come from an external record source; the engine only sees which
//! attributes bear files and what keys those attributes currently hold. An
//! attribute holds zero files (`Empty`), one (`Single`) or an ordered
//! sequence (`Multi`); the distinction is resolved once, at enumeration time.

use std::collections::BTreeMap;

use crate::error::{MigrateError, MigrateResult};

/// Split an `app_name.ModelName` label into its two parts.
pub fn split_label(label: &str) -> MigrateResult<(&str, &str)> {
    match label.split_once('.') {
        Some((app, model)) if !app.is_empty() && !model.is_empty() && !model.contains('.') => {
            Ok((app, model))
        }
        _ => Err(MigrateError::InvalidLabel(format!(
            "expected app_name.ModelName, got {:?}",
            label
        ))),
    }
}

/// Value of a file-bearing attribute on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// No file set. Enumerates as a single empty key so the report accounts
    /// for the field.
    Empty,
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Keys held by this value, in order. `Empty` yields one empty key.
    pub fn keys(&self) -> Vec<String> {
        match self {
            FieldValue::Empty => vec![String::new()],
            FieldValue::Single(key) => vec![key.clone()],
            FieldValue::Multi(keys) if keys.is_empty() => vec![String::new()],
            FieldValue::Multi(keys) => keys.clone(),
        }
    }
}

/// One record instance as seen by the enumerator.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A record type and its file-bearing attributes, in declaration order.
#[derive(Debug, Clone)]
pub struct RecordType {
    pub name: String,
    pub file_attributes: Vec<String>,
}

/// One (record, attribute, key) triple produced by the enumerator.
/// An empty key means the attribute has no file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub record_id: String,
    pub attribute: String,
    pub key: String,
}

impl FileReference {
    pub fn new(
        record_id: impl Into<String>,
        attribute: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        FileReference {
            record_id: record_id.into(),
            attribute: attribute.into(),
            key: key.into(),
        }
    }
}
