//! Batch Comparator
//!
//! Compares the existence maps every cluster returned for one batch against the
//! reference cluster's map.
//!
//! ## Invariants
//! - Every non-reference map must hold exactly as many identifiers as the
//!   reference. Anything else means the request or the batching is broken, so
//!   the batch is rejected with `CountMismatch` before any comparison happens.
//! - Each identifier of a non-reference map is consumed when it is matched
//!   against the reference. Identifiers left over afterwards were never part of
//!   the reference map and fail the batch with `OrphanDocument`.
//!
//! On error no records are returned at all, not even for identifiers compared
//! before the failure was detected.

use super::types::{DivergenceRecord, ExistenceMap};
use crate::config::{ClusterName, Collection};
use crate::error::{CheckError, Result};

pub fn compare(
    collection: &Collection,
    reference: &ExistenceMap,
    others: Vec<(ClusterName, ExistenceMap)>,
) -> Result<Vec<DivergenceRecord>> {
    for (cluster, map) in &others {
        if map.len() != reference.len() {
            return Err(CheckError::CountMismatch {
                cluster: cluster.clone(),
                expected: reference.len(),
                actual: map.len(),
            });
        }
    }

    let mut others = others;
    let mut records = Vec::new();

    for (&id, &reference_found) in reference {
        let mut divergent = Vec::new();

        for (cluster, map) in others.iter_mut() {
            if let Some(found) = map.remove(&id)
                && found != reference_found
            {
                divergent.push(cluster.clone());
            }
        }

        if !divergent.is_empty() {
            records.push(DivergenceRecord {
                collection: collection.clone(),
                id,
                reference_found,
                clusters: divergent,
            });
        }
    }

    for (cluster, map) in others {
        if !map.is_empty() {
            return Err(CheckError::OrphanDocument {
                cluster,
                ids: map.into_keys().collect(),
            });
        }
    }

    Ok(records)
}
