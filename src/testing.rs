//! In-process fake search cluster used by the tests.
//!
//! Serves `POST /{index}/_mget` like a search backend would: every requested id
//! comes back with its `found` flag. Failures, truncated responses and docs
//! nobody asked for can be injected to exercise the retry and comparison paths.

use crate::client::protocol::{MultiGetDoc, MultiGetRequest, MultiGetResponse};
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeSearchCluster {
    /// index name -> ids of documents present in that index
    indexes: DashMap<String, HashSet<u64>>,
    /// Number of upcoming requests answered with a 503.
    failures_remaining: AtomicUsize,
    /// When set, found=false docs are left out of responses.
    omit_missing: AtomicBool,
    /// Number of upcoming responses carrying one doc that was never requested.
    unrequested_remaining: AtomicUsize,
    requests: AtomicUsize,
}

impl FakeSearchCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks `ids` as present in `index`.
    pub fn insert(&self, index: &str, ids: impl IntoIterator<Item = u64>) {
        self.indexes
            .entry(index.to_string())
            .or_default()
            .extend(ids);
    }

    pub fn remove(&self, index: &str, id: u64) {
        if let Some(mut docs) = self.indexes.get_mut(index) {
            docs.remove(&id);
        }
    }

    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn omit_missing(&self, omit: bool) {
        self.omit_missing.store(omit, Ordering::SeqCst);
    }

    /// The next `count` successful responses also answer for the id right
    /// after the last requested one.
    pub fn answer_unrequested(&self, count: usize) {
        self.unrequested_remaining.store(count, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Serves this cluster on an ephemeral local port and returns its base URL.
    pub async fn spawn(self: &Arc<Self>) -> String {
        let app = Router::new()
            .route("/:index/_mget", post(handle_mget))
            .layer(Extension(self.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

async fn handle_mget(
    Extension(cluster): Extension<Arc<FakeSearchCluster>>,
    Path(index): Path<String>,
    Json(req): Json<MultiGetRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    cluster.requests.fetch_add(1, Ordering::SeqCst);

    let should_fail = cluster
        .failures_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if should_fail {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "unavailable" })),
        );
    }

    let omit_missing = cluster.omit_missing.load(Ordering::SeqCst);
    let unrequested = req
        .ids
        .iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map(|last| last + 1);

    let present = cluster.indexes.get(&index);
    let mut docs: Vec<MultiGetDoc> = req
        .ids
        .into_iter()
        .map(|id| {
            let found = id
                .parse::<u64>()
                .ok()
                .and_then(|id| present.as_ref().map(|docs| docs.contains(&id)))
                .unwrap_or(false);
            MultiGetDoc { id, found }
        })
        .filter(|doc| doc.found || !omit_missing)
        .collect();

    let answer_unrequested = cluster
        .unrequested_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if answer_unrequested && let Some(id) = unrequested {
        docs.push(MultiGetDoc {
            id: id.to_string(),
            found: true,
        });
    }

    (
        StatusCode::OK,
        Json(serde_json::to_value(MultiGetResponse { docs }).unwrap()),
    )
}
