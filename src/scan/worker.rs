//! Comparison Worker
//!
//! Walks one identifier range in ascending batches. For every batch it checks
//! each collection in declared order, asking every cluster in registry order
//! (one at a time, to keep the load on any single backend bounded), and hands
//! divergences to the repair emitter.
//!
//! A failed batch (retries exhausted, count mismatch, orphan document) is
//! logged and skipped; the worker moves on to the next batch. Only
//! cancellation or a closed channel stops it early.

use super::comparator::compare;
use super::types::{ExistenceMap, IdentifierRange};
use crate::client::ExistenceClient;
use crate::config::{Cluster, ClusterName, ClusterRegistry, Collection, ScanConfig};
use crate::error::CheckError;
use crate::repair::DivergenceSender;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What one worker did over its range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub batches_checked: u64,
    pub batches_failed: u64,
    pub ids_checked: u64,
    pub divergent_records: u64,
    /// Divergent identifiers per non-reference cluster.
    pub divergences: BTreeMap<ClusterName, u64>,
    pub cancelled: bool,
}

impl WorkerReport {
    pub fn merge(&mut self, other: &WorkerReport) {
        self.batches_checked += other.batches_checked;
        self.batches_failed += other.batches_failed;
        self.ids_checked += other.ids_checked;
        self.divergent_records += other.divergent_records;
        for (cluster, count) in &other.divergences {
            *self.divergences.entry(cluster.clone()).or_insert(0) += count;
        }
        self.cancelled |= other.cancelled;
    }
}

/// Why a batch did not complete.
enum BatchAbort {
    Failed(CheckError),
    Cancelled,
    ChannelClosed,
}

impl From<CheckError> for BatchAbort {
    fn from(err: CheckError) -> Self {
        BatchAbort::Failed(err)
    }
}

pub struct ComparisonWorker {
    worker_id: usize,
    range: IdentifierRange,
    config: Arc<ScanConfig>,
    registry: Arc<ClusterRegistry>,
    client: ExistenceClient,
    divergences: DivergenceSender,
    cancel: CancellationToken,
}

impl ComparisonWorker {
    pub fn new(
        worker_id: usize,
        range: IdentifierRange,
        config: Arc<ScanConfig>,
        registry: Arc<ClusterRegistry>,
        divergences: DivergenceSender,
        cancel: CancellationToken,
    ) -> Self {
        let client = ExistenceClient::from_config(&config);
        Self {
            worker_id,
            range,
            config,
            registry,
            client,
            divergences,
            cancel,
        }
    }

    /// Walks the whole range and reports what happened.
    pub async fn run(self) -> WorkerReport {
        tracing::info!("Worker {} started on {}", self.worker_id, self.range);
        let mut report = WorkerReport::default();

        for batch in self.range.batches(self.config.batch_size) {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.check_batch(batch, &mut report).await {
                Ok(()) => {
                    report.batches_checked += 1;
                    report.ids_checked += batch.len();
                }
                Err(BatchAbort::Failed(e)) => {
                    tracing::error!(
                        "Worker {} skipping batch {}: {}",
                        self.worker_id,
                        batch,
                        e
                    );
                    report.batches_failed += 1;
                }
                Err(BatchAbort::Cancelled) => {
                    tracing::info!("Worker {} cancelled at batch {}", self.worker_id, batch);
                    report.cancelled = true;
                    break;
                }
                Err(BatchAbort::ChannelClosed) => {
                    tracing::warn!(
                        "Worker {} stopping at batch {}: repair emitter is gone",
                        self.worker_id,
                        batch
                    );
                    report.cancelled = true;
                    break;
                }
            }
        }

        tracing::info!(
            "Worker {} finished {}: {} batches checked, {} failed, {} divergent ids",
            self.worker_id,
            self.range,
            report.batches_checked,
            report.batches_failed,
            report.divergent_records
        );
        report
    }

    async fn check_batch(
        &self,
        batch: IdentifierRange,
        report: &mut WorkerReport,
    ) -> Result<(), BatchAbort> {
        let ids = batch.ids();

        for collection in &self.config.collections {
            let reference = self.fetch(self.registry.reference(), collection, &ids).await?;

            let mut others = Vec::with_capacity(self.registry.others().len());
            for cluster in self.registry.others() {
                let map = self.fetch(cluster, collection, &ids).await?;
                others.push((cluster.name.clone(), map));
            }

            let records = compare(collection, &reference, others)?;

            if self.config.log_sane {
                let divergent: HashSet<u64> = records.iter().map(|r| r.id).collect();
                for id in reference.keys().filter(|id| !divergent.contains(id)) {
                    tracing::debug!("Sane: {} {} in {}", self.config.wiki, id, collection);
                }
            }

            for record in records {
                tracing::debug!(
                    "Divergence in {} for id {}: reference found={}, divergent on {:?}",
                    collection,
                    record.id,
                    record.reference_found,
                    record.clusters
                );
                report.divergent_records += 1;
                for cluster in &record.clusters {
                    *report.divergences.entry(cluster.clone()).or_insert(0) += 1;
                }
                self.divergences
                    .send(record)
                    .map_err(|_| BatchAbort::ChannelClosed)?;
            }
        }

        Ok(())
    }

    async fn fetch(
        &self,
        cluster: &Cluster,
        collection: &Collection,
        ids: &[u64],
    ) -> Result<ExistenceMap, BatchAbort> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BatchAbort::Cancelled),
            result = self.client.check(cluster, &self.config.wiki, collection, ids) => {
                Ok(result?)
            }
        }
    }
}
