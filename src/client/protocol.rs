//! Existence Query Protocol
//!
//! Request and response bodies of the batched multi-get used to ask a search
//! cluster which documents of an index exist. Only the `found` flag is needed,
//! so document sources are never requested.

use serde::{Deserialize, Serialize};

/// Path segment appended to the index name.
pub const ENDPOINT_MGET: &str = "_mget";
/// Query string disabling `_source` in the response.
pub const MGET_QUERY: &str = "_source=false";

/// Body of a multi-get request.
#[derive(Debug, Serialize, Deserialize)]
pub struct MultiGetRequest {
    /// Document identifiers, as strings.
    pub ids: Vec<String>,
}

impl MultiGetRequest {
    pub fn from_ids(ids: &[u64]) -> Self {
        Self {
            ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// One entry of a multi-get response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MultiGetDoc {
    #[serde(rename = "_id")]
    pub id: String,
    /// Missing on error entries; treated as not found.
    #[serde(default)]
    pub found: bool,
}

/// Body of a multi-get response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MultiGetResponse {
    pub docs: Vec<MultiGetDoc>,
}
