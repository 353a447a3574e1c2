//! Divergence Channel
//!
//! Multi-producer, single-consumer hand-off from the comparison workers to the
//! repair emitter. Unbounded, so a worker never waits on another worker or on
//! the emitter.
//!
//! ## Close protocol
//! The orchestrator sends exactly one `Stop` after every worker has joined.
//! Messages are delivered in send order, so every divergence queued before
//! `Stop` is seen by the emitter before the sentinel. If every sender is
//! dropped without a `Stop`, the receiver reports the channel as closed.
//!
//! Order across workers is not defined: records from different workers
//! interleave however the workers happened to be scheduled.

use crate::scan::types::DivergenceRecord;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum ChannelMessage {
    Divergence(DivergenceRecord),
    /// End of work. Nothing sent after it is processed.
    Stop,
}

/// Returned when the emitter is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

#[derive(Debug, Clone)]
pub struct DivergenceSender {
    tx: mpsc::UnboundedSender<ChannelMessage>,
}

impl DivergenceSender {
    pub fn send(&self, record: DivergenceRecord) -> Result<(), ChannelClosed> {
        self.tx
            .send(ChannelMessage::Divergence(record))
            .map_err(|_| ChannelClosed)
    }

    /// Sends the end-of-work sentinel.
    pub fn stop(&self) -> Result<(), ChannelClosed> {
        self.tx.send(ChannelMessage::Stop).map_err(|_| ChannelClosed)
    }
}

#[derive(Debug)]
pub struct DivergenceReceiver {
    rx: mpsc::UnboundedReceiver<ChannelMessage>,
}

impl DivergenceReceiver {
    /// Waits for the next message. `None` once all senders are dropped and
    /// the queue is empty.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.rx.recv().await
    }
}

pub fn divergence_channel() -> (DivergenceSender, DivergenceReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DivergenceSender { tx }, DivergenceReceiver { rx })
}
