//! Reference enumeration.
//!
//! Walks every record of a type and emits one [`FileReference`] per
//! (record, attribute, key) triple. Multi-value attributes expand into one
//! reference per key, in order; an unset attribute yields a single empty-key
//! reference so the copy engine can account for it in the report.

use filemig_core::{FieldValue, FileReference, MigrateResult, RecordType};

use crate::source::RecordSource;

/// Enumerate file references for every stored record of `record_type`.
///
/// The record source is queried afresh on each call; calling this again
/// re-enumerates from the store's current state.
pub fn enumerate_references(
    source: &dyn RecordSource,
    record_type: &RecordType,
) -> MigrateResult<Vec<FileReference>> {
    let records = source.records(&record_type.name)?;
    let mut references = Vec::new();

    for record in &records {
        tracing::debug!(record = %record.id, "enumerating record");
        for attribute in &record_type.file_attributes {
            let value = record.fields.get(attribute).unwrap_or(&FieldValue::Empty);
            for key in value.keys() {
                references.push(FileReference::new(record.id.as_str(), attribute.as_str(), key));
            }
        }
    }

    Ok(references)
}
