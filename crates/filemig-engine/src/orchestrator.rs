//! Migration orchestrator.
//!
//! Sequences enumeration, resolution, and copying across one or more record
//! type labels. Each label is processed independently: a label that fails to
//! resolve never prevents the remaining labels from running, and an
//! individual failed copy never cancels sibling work. The orchestrator holds
//! no state across labels.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use filemig_core::{
    BackendSpec, CopyDecision, KeyOutcome, LabelResult, MigrationConfig, MigrationReport,
};
use filemig_storage::{create_backend, Storage, StorageResult};

use crate::copier::CopyEngine;
use crate::enumerate::enumerate_references;
use crate::resolver::{BackendResolver, Direction};
use crate::source::RecordSource;

type BoundBackends = BTreeMap<String, (Arc<dyn Storage>, Arc<dyn Storage>)>;

pub struct Migrator<S> {
    config: MigrationConfig,
    direction: Direction,
    overwrite: bool,
    records: S,
}

impl<S: RecordSource> Migrator<S> {
    pub fn new(config: MigrationConfig, direction: Direction, overwrite: bool, records: S) -> Self {
        Migrator {
            config,
            direction,
            overwrite,
            records,
        }
    }

    /// Process every label in order and return one result per label.
    pub async fn run(&self, labels: &[String]) -> Vec<LabelResult> {
        let mut results = Vec::with_capacity(labels.len());
        for label in labels {
            let result = self.run_label(label).await;
            match &result {
                LabelResult::Completed(report) => tracing::info!(
                    label = %label,
                    processed = report.processed,
                    copied = report.copied,
                    skipped = report.skipped(),
                    failed = report.failed,
                    "label migration finished"
                ),
                LabelResult::Skipped { message, .. } => {
                    tracing::warn!(label = %label, message = %message, "label skipped")
                }
            }
            results.push(result);
        }
        results
    }

    async fn run_label(&self, label: &str) -> LabelResult {
        let Some(record_type) = self.records.record_type(label) else {
            return LabelResult::model_not_found(label);
        };

        let resolver = BackendResolver::new(&self.config, self.direction);
        let bindings = match resolver.resolve(&record_type) {
            Ok(bindings) => bindings,
            Err(e) => return LabelResult::nothing_to_migrate(label, &e.to_string()),
        };

        let references = match enumerate_references(&self.records, &record_type) {
            Ok(references) => references,
            Err(e) => {
                return LabelResult::nothing_to_migrate(label, &format!("Enumeration failed: {}", e))
            }
        };

        // One handle per distinct backend location; equal specs share a handle.
        let mut cache: HashMap<String, Arc<dyn Storage>> = HashMap::new();
        let mut bound: BoundBackends = BTreeMap::new();
        for (attribute, binding) in &bindings {
            let source = match backend_handle(&mut cache, &binding.source).await {
                Ok(handle) => handle,
                Err(e) => return LabelResult::nothing_to_migrate(label, &e.to_string()),
            };
            let destination = match backend_handle(&mut cache, &binding.destination).await {
                Ok(handle) => handle,
                Err(e) => return LabelResult::nothing_to_migrate(label, &e.to_string()),
            };
            bound.insert(attribute.clone(), (source, destination));
        }

        let engine = Arc::new(CopyEngine::new(self.overwrite, self.config.copy_timeout));
        let total = references.len();
        let mut report = MigrationReport::new(label);

        if self.config.max_concurrent_copies <= 1 {
            for (index, reference) in references.into_iter().enumerate() {
                let Some((source, destination)) = bound.get(&reference.attribute) else {
                    report.record(KeyOutcome {
                        reference,
                        decision: CopyDecision::Failed(
                            "no backend binding for attribute".to_string(),
                        ),
                    });
                    continue;
                };
                let decision = engine
                    .process(
                        &reference,
                        source.as_ref(),
                        destination.as_ref(),
                        index + 1,
                        total,
                    )
                    .await;
                report.record(KeyOutcome {
                    reference,
                    decision,
                });
            }
        } else {
            self.run_pool(&mut report, references, Arc::new(bound), engine, total)
                .await;
        }

        LabelResult::Completed(report)
    }

    /// Bounded worker pool over independent references. Same-key work is
    /// serialized through a per-key lock so no two workers race an
    /// exists-then-save sequence for one key; outcomes are folded back into
    /// the report in enumeration order.
    async fn run_pool(
        &self,
        report: &mut MigrationReport,
        references: Vec<filemig_core::FileReference>,
        bound: Arc<BoundBackends>,
        engine: Arc<CopyEngine>,
        total: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_copies));
        let key_locks = Arc::new(KeyLocks::default());
        let mut join_set = JoinSet::new();

        for (index, reference) in references.into_iter().enumerate() {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let bound = bound.clone();
            let engine = engine.clone();
            let key_locks = key_locks.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let Some((source, destination)) = bound.get(&reference.attribute).cloned() else {
                    return (
                        index,
                        KeyOutcome {
                            reference,
                            decision: CopyDecision::Failed(
                                "no backend binding for attribute".to_string(),
                            ),
                        },
                    );
                };
                let _guard = key_locks.lock(&reference.key).await;
                let decision = engine
                    .process(
                        &reference,
                        source.as_ref(),
                        destination.as_ref(),
                        index + 1,
                        total,
                    )
                    .await;
                (index, KeyOutcome { reference, decision })
            });
        }

        let mut slots: Vec<Option<KeyOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "copy task panicked"),
            }
        }
        for outcome in slots.into_iter().flatten() {
            report.record(outcome);
        }
    }
}

async fn backend_handle(
    cache: &mut HashMap<String, Arc<dyn Storage>>,
    spec: &BackendSpec,
) -> StorageResult<Arc<dyn Storage>> {
    let uri = spec.to_string();
    if let Some(handle) = cache.get(&uri) {
        return Ok(handle.clone());
    }
    let handle = create_backend(spec).await?;
    cache.insert(uri, handle.clone());
    Ok(handle)
}

/// Per-key locks for the worker pool.
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn lock(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}
