//! Search Replica Consistency Checker Library
//!
//! Verifies that independently maintained search clusters agree on which
//! documents exist, across the whole identifier space of a wiki, and emits a
//! repair directive for every divergence found. The binary (`main.rs`) is a
//! thin command-line wrapper around [`scan::Orchestrator`].
//!
//! ## Architecture Modules
//! - **`config`**: The ordered cluster registry (first entry = reference cluster)
//!   and the immutable scan configuration.
//! - **`client`**: Batched existence queries against one cluster, with bounded retry.
//! - **`scan`**: Range partitioning, the per-batch comparator, the parallel
//!   comparison workers and the orchestrator tying them together.
//! - **`repair`**: The divergence channel and the emitter that turns divergences
//!   into repair directives for an external executor.
//! - **`error`**: Batch-level and fatal error taxonomy.

pub mod client;
pub mod config;
pub mod error;
pub mod repair;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;
