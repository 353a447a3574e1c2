use super::protocol::{ENDPOINT_MGET, MGET_QUERY, MultiGetRequest, MultiGetResponse};
use crate::config::{Cluster, Collection, RetryPolicy, ScanConfig, Wiki};
use crate::error::{CheckError, Result};
use crate::scan::types::ExistenceMap;

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Asks one cluster at a time which identifiers of a batch exist.
///
/// Holds a single `reqwest::Client` for its whole lifetime so the connection
/// pool is reused across batches. Each worker owns its own client.
pub struct ExistenceClient {
    http_client: reqwest::Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ExistenceClient {
    pub fn new(retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            retry,
            timeout,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.retry.clone(), config.request_timeout)
    }

    /// Issues one multi-get for `ids` against `cluster`.
    ///
    /// The returned map holds every queried identifier exactly once.
    /// Identifiers the cluster did not mention are reported as not found.
    /// Identifiers it answered for without being asked stay in the map, so
    /// the comparator rejects the batch instead of comparing a subset.
    ///
    /// Any failure (transport, non-2xx status, undecodable body) is retried up
    /// to the policy's attempt ceiling before `TransientNetwork` is returned.
    /// Duplicate or non-numeric `_id`s fail with `MalformedResponse`.
    pub async fn check(
        &self,
        cluster: &Cluster,
        wiki: &Wiki,
        collection: &Collection,
        ids: &[u64],
    ) -> Result<ExistenceMap> {
        let index = collection.index_name(wiki);
        let url = format!(
            "{}/{}/{}?{}",
            cluster.endpoint.as_str().trim_end_matches('/'),
            index,
            ENDPOINT_MGET,
            MGET_QUERY
        );
        let payload = MultiGetRequest::from_ids(ids);

        let response = with_retry(&self.retry, |attempt| {
            tracing::trace!(
                "mget {} on {} ({} ids, attempt {})",
                index,
                cluster.name,
                ids.len(),
                attempt + 1
            );
            self.query_once(&url, &payload)
        })
        .await
        .map_err(|message| CheckError::TransientNetwork {
            cluster: cluster.name.clone(),
            index: index.clone(),
            attempts: self.retry.attempts,
            message,
        })?;

        to_existence_map(ids, response).map_err(|message| CheckError::MalformedResponse {
            cluster: cluster.name.clone(),
            index,
            message,
        })
    }

    async fn query_once(
        &self,
        url: &str,
        payload: &MultiGetRequest,
    ) -> std::result::Result<MultiGetResponse, String> {
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("mget failed with status {}", response.status()));
        }

        response
            .json::<MultiGetResponse>()
            .await
            .map_err(|e| format!("malformed mget response: {}", e))
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// `op` receives the zero-based attempt number. The last error is returned
/// once every attempt has failed.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> std::result::Result<T, E>
where
    E: Display,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 >= attempts {
                    return Err(e);
                }
                tracing::warn!("Attempt {}/{} failed: {}", attempt + 1, attempts, e);

                let delay = policy.delay_after(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

pub(crate) fn to_existence_map(
    ids: &[u64],
    response: MultiGetResponse,
) -> std::result::Result<ExistenceMap, String> {
    let mut map: ExistenceMap = ids.iter().map(|id| (*id, false)).collect();
    let mut reported = HashSet::with_capacity(response.docs.len());

    for doc in response.docs {
        let id = doc
            .id
            .parse::<u64>()
            .map_err(|_| format!("non-numeric _id '{}'", doc.id))?;
        if !reported.insert(id) {
            return Err(format!("duplicate _id {}", id));
        }
        map.insert(id, doc.found);
    }

    Ok(map)
}
