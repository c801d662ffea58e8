//! Per-key decisions and the aggregated migration report.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::record::FileReference;

/// Terminal outcome for one file key. Produced fresh per key, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyDecision {
    /// The attribute holds no file.
    SkippedEmpty,
    /// Source and destination are the same backend; migrating into itself is
    /// always a no-op, regardless of the overwrite flag.
    SkippedSameBackend,
    /// The key does not exist in the source backend.
    SkippedMissingSource,
    /// The key already exists in the destination and overwrite is disabled.
    SkippedExistsNoOverwrite,
    Copied,
    /// The transfer failed; the cause is captured verbatim.
    Failed(String),
}

impl CopyDecision {
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            CopyDecision::SkippedEmpty
                | CopyDecision::SkippedSameBackend
                | CopyDecision::SkippedMissingSource
                | CopyDecision::SkippedExistsNoOverwrite
        )
    }
}

impl Display for CopyDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CopyDecision::SkippedEmpty => write!(f, "skipped (empty)"),
            CopyDecision::SkippedSameBackend => write!(f, "skipped (same backend)"),
            CopyDecision::SkippedMissingSource => write!(f, "skipped (missing in source)"),
            CopyDecision::SkippedExistsNoOverwrite => write!(f, "skipped (exists, no overwrite)"),
            CopyDecision::Copied => write!(f, "copied"),
            CopyDecision::Failed(cause) => write!(f, "failed: {}", cause),
        }
    }
}

/// A reference paired with its terminal decision.
#[derive(Debug, Clone)]
pub struct KeyOutcome {
    pub reference: FileReference,
    pub decision: CopyDecision,
}

/// Aggregated counters plus the ordered list of per-key decisions for one
/// record type's run. Built incrementally; every enumerated reference reaches
/// exactly one entry here, failures included.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub label: String,
    pub processed: usize,
    pub copied: usize,
    pub failed: usize,
    pub skipped_empty: usize,
    pub skipped_same_backend: usize,
    pub skipped_missing_source: usize,
    pub skipped_exists: usize,
    pub outcomes: Vec<KeyOutcome>,
}

impl MigrationReport {
    pub fn new(label: impl Into<String>) -> Self {
        MigrationReport {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: KeyOutcome) {
        self.processed += 1;
        match &outcome.decision {
            CopyDecision::SkippedEmpty => self.skipped_empty += 1,
            CopyDecision::SkippedSameBackend => self.skipped_same_backend += 1,
            CopyDecision::SkippedMissingSource => self.skipped_missing_source += 1,
            CopyDecision::SkippedExistsNoOverwrite => self.skipped_exists += 1,
            CopyDecision::Copied => self.copied += 1,
            CopyDecision::Failed(_) => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn skipped(&self) -> usize {
        self.skipped_empty
            + self.skipped_same_backend
            + self.skipped_missing_source
            + self.skipped_exists
    }
}

impl Display for MigrationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}: {} processed, {} copied, {} skipped, {} failed",
            self.label,
            self.processed,
            self.copied,
            self.skipped(),
            self.failed
        )
    }
}

/// Result of processing one label. A failed label never prevents the
/// remaining labels from being processed.
#[derive(Debug, Clone)]
pub enum LabelResult {
    Completed(MigrationReport),
    Skipped { label: String, message: String },
}

impl LabelResult {
    pub fn model_not_found(label: &str) -> Self {
        LabelResult::Skipped {
            label: label.to_string(),
            message: format!("Skipped {}. Model not found.", label),
        }
    }

    pub fn nothing_to_migrate(label: &str, reason: &str) -> Self {
        LabelResult::Skipped {
            label: label.to_string(),
            message: format!("Skipped {}. {}", label, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FileReference;

    fn outcome(key: &str, decision: CopyDecision) -> KeyOutcome {
        KeyOutcome {
            reference: FileReference::new("1", "image", key),
            decision,
        }
    }

    #[test]
    fn test_report_counters() {
        let mut report = MigrationReport::new("gallery.Photo");
        report.record(outcome("a.jpg", CopyDecision::Copied));
        report.record(outcome("b.jpg", CopyDecision::SkippedExistsNoOverwrite));
        report.record(outcome("", CopyDecision::SkippedEmpty));
        report.record(outcome("c.jpg", CopyDecision::Failed("disk full".to_string())));

        assert_eq!(report.processed, 4);
        assert_eq!(report.copied, 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(
            report.to_string(),
            "gallery.Photo: 4 processed, 1 copied, 2 skipped, 1 failed"
        );
    }

    #[test]
    fn test_model_not_found_message() {
        let result = LabelResult::model_not_found("gallery.Photo");
        match result {
            LabelResult::Skipped { message, .. } => {
                assert_eq!(message, "Skipped gallery.Photo. Model not found.")
            }
            _ => panic!("expected skipped result"),
        }
    }
}
