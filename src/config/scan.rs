use crate::error::{CheckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

/// Identifiers per existence query. Bounded by the backend's request size limits.
pub const BATCH_SIZE: usize = 2000;
/// Added to the resolved max id to cover documents created while the scan runs.
pub const MAX_ID_SAFETY_MARGIN: u64 = 5000;
/// Default hard cap on the number of parallel workers.
pub const DEFAULT_WORKER_CAP: usize = 30;
/// A worker is only spawned per this many batches of identifier space.
pub const MIN_WORK_UNIT_BATCHES: usize = 10;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_ATTEMPTS: usize = 3;
const MAX_RETRY_DELAY: Duration = Duration::from_millis(1200);

static WIKI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("wiki pattern is valid"));

/// A wiki database name (e.g. `enwiki`). Forms the prefix of every index name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct Wiki(String);

impl Wiki {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Wiki {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        if WIKI_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CheckError::Config(format!(
                "invalid wiki '{}': expected lowercase letters, digits and underscores",
                s
            )))
        }
    }
}

impl TryFrom<String> for Wiki {
    type Error = CheckError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Wiki {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logical sub-index of a wiki (`content`, `general`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct Collection(pub String);

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The default collections, in the order they are checked.
    pub fn defaults() -> Vec<Collection> {
        vec![Collection::new("content"), Collection::new("general")]
    }

    /// Name of the index holding this collection for `wiki`.
    pub fn index_name(&self, wiki: &Wiki) -> String {
        format!("{}_{}", wiki, self.0)
    }
}

impl FromStr for Collection {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        if WIKI_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CheckError::Config(format!("invalid collection '{}'", s)))
        }
    }
}

impl TryFrom<String> for Collection {
    type Error = CheckError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How failed existence queries are retried.
///
/// The attempt ceiling counts the first request. A zero `base_delay` retries
/// immediately; otherwise the delay doubles per attempt up to `max_delay`
/// with up to 50ms of jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: Duration::ZERO,
            max_delay: MAX_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_backoff(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Default::default()
        }
    }

    /// Delay before retrying after the given zero-based failed attempt.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32 << attempt.min(16);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter = rand::random::<u64>() % 50;
        delay + Duration::from_millis(jitter)
    }
}

/// Everything a scan needs besides the cluster registry.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub wiki: Wiki,
    /// Checked in this order for every batch.
    pub collections: Vec<Collection>,
    pub batch_size: usize,
    /// Upper bound on the number of parallel workers.
    pub worker_cap: usize,
    /// Identifier span below which no additional worker is spawned.
    pub min_work_unit: u64,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Log identifiers found consistent on every cluster.
    pub log_sane: bool,
    /// Repair every registry cluster for a divergent id, not only the divergent ones.
    pub resync_all: bool,
}

impl ScanConfig {
    pub fn new(wiki: Wiki) -> Self {
        Self {
            wiki,
            collections: Collection::defaults(),
            batch_size: BATCH_SIZE,
            worker_cap: DEFAULT_WORKER_CAP,
            min_work_unit: (BATCH_SIZE * MIN_WORK_UNIT_BATCHES) as u64,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            log_sane: false,
            resync_all: false,
        }
    }

    pub fn with_collections(mut self, collections: Vec<Collection>) -> Self {
        self.collections = collections;
        self
    }

    pub fn with_worker_cap(mut self, worker_cap: usize) -> Self {
        self.worker_cap = worker_cap;
        self
    }

    pub fn with_min_work_unit(mut self, min_work_unit: u64) -> Self {
        self.min_work_unit = min_work_unit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_log_sane(mut self, log_sane: bool) -> Self {
        self.log_sane = log_sane;
        self
    }

    pub fn with_resync_all(mut self, resync_all: bool) -> Self {
        self.resync_all = resync_all;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(CheckError::Config("at least one collection is required".to_string()));
        }
        if self.batch_size == 0 {
            return Err(CheckError::Config("batch size must be positive".to_string()));
        }
        if self.worker_cap == 0 {
            return Err(CheckError::Config("worker cap must be at least 1".to_string()));
        }
        if self.min_work_unit == 0 {
            return Err(CheckError::Config("min work unit must be positive".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(CheckError::Config("request timeout must be positive".to_string()));
        }
        if self.retry.attempts == 0 {
            return Err(CheckError::Config("retry attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}
