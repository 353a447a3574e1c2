//! Scan Orchestrator
//!
//! Drives one full scan:
//! 1. Resolve the max id and add the safety margin.
//! 2. Partition `[1, max_id]` into one range per worker.
//! 3. Start the repair emitter, then one `ComparisonWorker` task per range.
//! 4. Join every worker, send the stop sentinel, join the emitter.
//!
//! Cancelling the token stops workers and emitter promptly. Directives already
//! written stay valid since each one is an idempotent repair on its own.

use super::partitioner::RangePartitioner;
use super::source::MaxIdSource;
use super::worker::{ComparisonWorker, WorkerReport};
use crate::config::{ClusterName, ClusterRegistry, MAX_ID_SAFETY_MARGIN, ScanConfig, Wiki};
use crate::error::{CheckError, Result};
use crate::repair::{DirectiveSink, RepairEmitter, divergence_channel};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Summary of a finished (or cancelled) scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub wiki: Wiki,
    /// Upper bound of the scanned space, safety margin included.
    pub max_id: u64,
    pub partitions: usize,
    pub batches_checked: u64,
    pub batches_failed: u64,
    /// Worker tasks that panicked.
    pub workers_failed: u64,
    pub ids_checked: u64,
    pub divergent_records: u64,
    pub divergences: BTreeMap<ClusterName, u64>,
    pub directives_emitted: u64,
    pub cancelled: bool,
    pub elapsed_secs: f64,
}

impl ScanReport {
    /// True when part of the identifier space could not be checked.
    /// Divergences alone are not failures.
    pub fn has_failures(&self) -> bool {
        self.batches_failed > 0 || self.workers_failed > 0
    }
}

pub struct Orchestrator {
    config: Arc<ScanConfig>,
    registry: Arc<ClusterRegistry>,
}

impl Orchestrator {
    pub fn new(config: ScanConfig, registry: ClusterRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        })
    }

    /// Runs a complete scan, writing directives to `sink`.
    ///
    /// Only startup failures (max id, configuration) and a failing sink are
    /// returned as errors. Failed batches are counted in the report.
    pub async fn run<M, S>(
        &self,
        source: &M,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<(ScanReport, S)>
    where
        M: MaxIdSource,
        S: DirectiveSink,
    {
        let scan_id = Uuid::new_v4();
        let span = tracing::info_span!("scan", %scan_id, wiki = %self.config.wiki);
        self.run_scan(scan_id, source, sink, cancel)
            .instrument(span)
            .await
    }

    async fn run_scan<M, S>(
        &self,
        scan_id: Uuid,
        source: &M,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<(ScanReport, S)>
    where
        M: MaxIdSource,
        S: DirectiveSink,
    {
        let started = Instant::now();

        let live_max = source.max_id(&self.config.wiki).await?;
        let max_id = live_max
            .checked_add(MAX_ID_SAFETY_MARGIN)
            .filter(|max_id| *max_id < u64::MAX)
            .ok_or_else(|| {
                CheckError::MaxId(format!(
                    "max id {} is too large to scan with a margin of {}",
                    live_max, MAX_ID_SAFETY_MARGIN
                ))
            })?;
        let ranges = RangePartitioner::from_config(&self.config).partition(max_id);

        tracing::info!(
            "Checking ids 1..={} (live max {}) with {} workers, reference cluster {}, comparing {:?}",
            max_id,
            live_max,
            ranges.len(),
            self.registry.reference().name,
            self.registry.others().iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        let workers_cancel = cancel.child_token();
        let (divergences, receiver) = divergence_channel();

        let emitter = RepairEmitter::new(
            self.config.wiki.clone(),
            self.registry.clone(),
            receiver,
            sink,
            cancel.clone(),
        )
        .with_resync_all(self.config.resync_all);
        let emitter_handle = {
            let workers_cancel = workers_cancel.clone();
            tokio::spawn(
                async move {
                    let result = emitter.run().await;
                    if let Err(e) = &result {
                        tracing::error!("Repair emitter failed, stopping workers: {}", e);
                        workers_cancel.cancel();
                    }
                    result
                }
                .instrument(tracing::Span::current()),
            )
        };

        let mut handles = Vec::with_capacity(ranges.len());
        for (worker_id, range) in ranges.iter().enumerate() {
            let worker = ComparisonWorker::new(
                worker_id,
                *range,
                self.config.clone(),
                self.registry.clone(),
                divergences.clone(),
                workers_cancel.clone(),
            );
            handles.push(tokio::spawn(
                worker.run().instrument(tracing::Span::current()),
            ));
        }

        let mut totals = WorkerReport::default();
        let mut workers_failed = 0;
        for handle in handles {
            match handle.await {
                Ok(report) => totals.merge(&report),
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    workers_failed += 1;
                }
            }
        }

        if divergences.stop().is_err() {
            tracing::warn!("Repair emitter exited before the stop sentinel was sent");
        }
        drop(divergences);

        let (sink, emitted) = emitter_handle.await??;

        let report = ScanReport {
            scan_id,
            wiki: self.config.wiki.clone(),
            max_id,
            partitions: ranges.len(),
            batches_checked: totals.batches_checked,
            batches_failed: totals.batches_failed,
            workers_failed,
            ids_checked: totals.ids_checked,
            divergent_records: totals.divergent_records,
            divergences: totals.divergences,
            directives_emitted: emitted.directives,
            cancelled: cancel.is_cancelled() || totals.cancelled || emitted.cancelled,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Scan finished in {:.1}s: {} ids checked, {} batches failed, {} divergent ids, {} directives{}",
            report.elapsed_secs,
            report.ids_checked,
            report.batches_failed,
            report.divergent_records,
            report.directives_emitted,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        for (cluster, count) in &report.divergences {
            tracing::info!("  - {}: {} divergent ids", cluster, count);
        }

        Ok((report, sink))
    }
}
