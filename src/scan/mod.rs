//! Scan Module
//!
//! The consistency check itself: partition the identifier space, compare every
//! batch across clusters in parallel, and report divergences.
//!
//! ## Architecture Overview
//! 1. **Partitioning**: `RangePartitioner` cuts `[1, max_id]` into disjoint ranges.
//! 2. **Workers**: one `ComparisonWorker` task per range, each with its own HTTP
//!    session. Workers share nothing but the divergence channel.
//! 3. **Comparison**: `compare` checks each batch against the reference cluster
//!    and rejects batches whose response shapes disagree.
//! 4. **Orchestration**: `Orchestrator` wires workers and the repair emitter
//!    together and owns the shutdown sequence.
//!
//! ## Ordering
//! Within a worker, batches are visited in ascending id order and collections in
//! declared order. Across workers nothing is ordered; directives from
//! different ranges may interleave arbitrarily.

pub mod comparator;
pub mod orchestrator;
pub mod partitioner;
pub mod source;
pub mod types;
pub mod worker;

pub use comparator::compare;
pub use orchestrator::{Orchestrator, ScanReport};
pub use partitioner::RangePartitioner;
pub use source::{FixedMaxId, MaxIdSource};
pub use types::{DivergenceRecord, ExistenceMap, IdentifierRange};
pub use worker::{ComparisonWorker, WorkerReport};
