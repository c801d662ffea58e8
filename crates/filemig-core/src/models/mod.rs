pub mod record;
pub mod report;

pub use record::{split_label, FieldValue, FileReference, Record, RecordType};
pub use report::{CopyDecision, KeyOutcome, LabelResult, MigrationReport};
