//! Repair Emitter
//!
//! Drains the divergence channel and turns every record into repair directives.
//!
//! ## Responsibilities
//! - **Expansion**: one directive per divergent cluster of a record, or one per
//!   registry cluster when every cluster should be re-synced.
//! - **Contiguity**: a record's directives go to the sink in a single call.
//! - **Shutdown**: stops on the `Stop` sentinel after having processed everything
//!   queued before it; stops immediately on cancellation.

use super::channel::{ChannelMessage, DivergenceReceiver};
use super::sink::DirectiveSink;
use super::types::RepairDirective;
use crate::config::{ClusterRegistry, Wiki};
use crate::error::Result;
use crate::scan::types::DivergenceRecord;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterReport {
    pub records: u64,
    pub directives: u64,
    pub cancelled: bool,
}

pub struct RepairEmitter<S> {
    wiki: Wiki,
    registry: Arc<ClusterRegistry>,
    resync_all: bool,
    receiver: DivergenceReceiver,
    sink: S,
    cancel: CancellationToken,
}

impl<S: DirectiveSink> RepairEmitter<S> {
    pub fn new(
        wiki: Wiki,
        registry: Arc<ClusterRegistry>,
        receiver: DivergenceReceiver,
        sink: S,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            wiki,
            registry,
            resync_all: false,
            receiver,
            sink,
            cancel,
        }
    }

    /// Emit a directive for every registry cluster instead of only the divergent ones.
    pub fn with_resync_all(mut self, resync_all: bool) -> Self {
        self.resync_all = resync_all;
        self
    }

    /// Runs until the stop sentinel, channel closure or cancellation.
    /// Returns the sink so callers can inspect or reuse it.
    pub async fn run(mut self) -> Result<(S, EmitterReport)> {
        tracing::debug!("Repair emitter started");
        let mut report = EmitterReport::default();

        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("Repair emitter cancelled");
                    report.cancelled = true;
                    break;
                }
                message = self.receiver.recv() => message,
            };

            match message {
                Some(ChannelMessage::Divergence(record)) => {
                    let directives = self.directives_for(&record);
                    self.sink.write_record(&directives)?;
                    report.records += 1;
                    report.directives += directives.len() as u64;
                }
                Some(ChannelMessage::Stop) => {
                    tracing::debug!("Repair emitter received stop");
                    break;
                }
                None => {
                    tracing::warn!("Divergence channel closed without stop sentinel");
                    break;
                }
            }
        }

        self.sink.flush()?;
        tracing::info!(
            "Repair emitter finished: {} records, {} directives",
            report.records,
            report.directives
        );
        Ok((self.sink, report))
    }

    fn directives_for(&self, record: &DivergenceRecord) -> Vec<RepairDirective> {
        let clusters = if self.resync_all {
            self.registry.names()
        } else {
            record.clusters.clone()
        };

        clusters
            .into_iter()
            .map(|cluster| RepairDirective {
                wiki: self.wiki.clone(),
                cluster,
                id: record.id,
            })
            .collect()
    }
}
