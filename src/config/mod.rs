//! Configuration Module
//!
//! Immutable values describing what a scan checks and how.
//!
//! ## Contents
//! - **`registry`**: The ordered set of clusters. The first entry is the reference
//!   cluster every other cluster is compared against.
//! - **`scan`**: Scan tuning (batch size, worker cap, retry policy, timeouts) and the
//!   wiki / collection identifiers that name the indexes being checked.
//!
//! Both are built once at startup and shared read-only (behind `Arc`) with every
//! worker. Nothing here is mutated after construction.

pub mod registry;
pub mod scan;

pub use registry::{Cluster, ClusterName, ClusterRegistry};
pub use scan::{
    BATCH_SIZE, Collection, DEFAULT_WORKER_CAP, MAX_ID_SAFETY_MARGIN, MIN_WORK_UNIT_BATCHES,
    RetryPolicy, ScanConfig, Wiki,
};

#[cfg(test)]
mod tests;
