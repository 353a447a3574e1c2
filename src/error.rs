//! Error types for the replica checker.
//!
//! Batch-level failures (`TransientNetwork`, `CountMismatch`, `OrphanDocument`,
//! `MalformedResponse`) only ever abort the batch they occurred in. Everything
//! else is fatal at startup. Operator cancellation is not an error and never appears here.

use crate::config::ClusterName;
use thiserror::Error;

/// Result type alias for checker operations.
pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Error, Debug)]
pub enum CheckError {
    /// The existence query kept failing after every retry attempt.
    #[error("existence query against {cluster} ({index}) failed after {attempts} attempts: {message}")]
    TransientNetwork {
        cluster: ClusterName,
        index: String,
        attempts: usize,
        message: String,
    },

    /// A cluster answered for a different number of identifiers than the reference.
    #[error("cluster {cluster} returned {actual} identifiers, reference returned {expected}")]
    CountMismatch {
        cluster: ClusterName,
        expected: usize,
        actual: usize,
    },

    /// A cluster answered with `_id`s that are not identifiers or repeat.
    #[error("malformed response from {cluster} ({index}): {message}")]
    MalformedResponse {
        cluster: ClusterName,
        index: String,
        message: String,
    },

    /// A cluster answered for identifiers the reference map never contained.
    #[error("cluster {cluster} holds identifiers unknown to the reference: {ids:?}")]
    OrphanDocument { cluster: ClusterName, ids: Vec<u64> },

    /// Invalid registry or scan configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The maximum identifier could not be resolved.
    #[error("unable to resolve max id: {0}")]
    MaxId(String),

    /// Writing repair directives failed.
    #[error("directive sink error: {0}")]
    Sink(#[from] std::io::Error),

    /// A spawned worker or emitter task panicked or was aborted.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CheckError {
    /// True for errors that skip a single batch without stopping the scan.
    pub fn is_batch_failure(&self) -> bool {
        matches!(
            self,
            CheckError::TransientNetwork { .. }
                | CheckError::CountMismatch { .. }
                | CheckError::OrphanDocument { .. }
                | CheckError::MalformedResponse { .. }
        )
    }
}
