use crate::error::{CheckError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Name of one search cluster (e.g. `eqiad`, `codfw`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterName(pub String);

impl ClusterName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cluster and the base URL its existence queries are sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub name: ClusterName,
    pub endpoint: Url,
}

impl Cluster {
    pub fn new(name: impl Into<String>, endpoint: &str) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CheckError::Config("cluster name must not be empty".to_string()));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| CheckError::Config(format!("invalid endpoint for {}: {}", name, e)))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(CheckError::Config(format!(
                "endpoint for {} must be http or https, got {}",
                name,
                endpoint.scheme()
            )));
        }

        Ok(Self {
            name: ClusterName(name),
            endpoint,
        })
    }
}

/// Parses `name=url`, the form clusters are given on the command line.
impl FromStr for Cluster {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, endpoint) = s.split_once('=').ok_or_else(|| {
            CheckError::Config(format!("expected <name>=<url>, got '{}'", s))
        })?;
        Cluster::new(name.trim(), endpoint.trim())
    }
}

/// Ordered, immutable mapping from cluster name to endpoint.
///
/// Invariants (checked in [`ClusterRegistry::new`]):
/// - at least two clusters
/// - names are unique
///
/// The first cluster is the reference; it is never reported as divergent.
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    clusters: Vec<Cluster>,
}

impl ClusterRegistry {
    pub fn new(clusters: Vec<Cluster>) -> Result<Self> {
        if clusters.len() < 2 {
            return Err(CheckError::Config(format!(
                "at least two clusters are required, got {}",
                clusters.len()
            )));
        }

        let mut seen = HashSet::new();
        for cluster in &clusters {
            if !seen.insert(cluster.name.clone()) {
                return Err(CheckError::Config(format!(
                    "duplicate cluster name: {}",
                    cluster.name
                )));
            }
        }

        Ok(Self { clusters })
    }

    /// The ground-truth cluster.
    pub fn reference(&self) -> &Cluster {
        &self.clusters[0]
    }

    /// Every cluster except the reference, in registry order.
    pub fn others(&self) -> &[Cluster] {
        &self.clusters[1..]
    }

    /// All cluster names, reference first.
    pub fn names(&self) -> Vec<ClusterName> {
        self.clusters.iter().map(|c| c.name.clone()).collect()
    }
}
