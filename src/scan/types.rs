//! Scan Data Types
//!
//! Identifier ranges handed to workers, the per-request existence maps, and the
//! divergence records passed on to the repair side.

use crate::config::{ClusterName, Collection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Found-state per identifier for one (cluster, collection, batch) request.
///
/// Ordered by identifier so comparisons and emitted records follow ascending id order.
pub type ExistenceMap = BTreeMap<u64, bool>;

/// Half-open identifier interval `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IdentifierRange {
    pub start: u64,
    pub end: u64,
}

impl IdentifierRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The identifiers of this range, ascending.
    pub fn ids(&self) -> Vec<u64> {
        (self.start..self.end).collect()
    }

    /// Splits the range into contiguous batches of at most `batch_size`
    /// identifiers. Only the last batch may be shorter.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = IdentifierRange> + use<> {
        let step = batch_size.max(1) as u64;
        let end = self.end;
        (self.start..end)
            .step_by(step as usize)
            .map(move |start| IdentifierRange::new(start, start.saturating_add(step).min(end)))
    }
}

impl fmt::Display for IdentifierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One identifier on which some clusters disagree with the reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DivergenceRecord {
    pub collection: Collection,
    pub id: u64,
    /// Whether the reference cluster has the document. `true` means the
    /// divergent clusters are missing it, `false` means they hold a ghost.
    pub reference_found: bool,
    /// Divergent clusters in registry order. Never contains the reference.
    pub clusters: Vec<ClusterName>,
}
