//! Per-viewer vote/favorite status lookup with a local cache.
//!
//! Status failures never block the feed: a chunk that errors or times out
//! is logged and left out, so those items render with no interaction
//! state and are fetched again on the next request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use campus_feed_models::{ContentItem, FeedItem, InteractionState};
use campus_feed_traits::DocumentStore;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, warn};

pub struct InteractionStore {
    store: Arc<dyn DocumentStore>,
    viewer_id: Option<String>,
    batch_size: usize,
    timeout: Duration,
    // Fetched states, including defaults for items the viewer never touched.
    cache: Mutex<HashMap<String, InteractionState>>,
}

impl InteractionStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        viewer_id: Option<String>,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            viewer_id,
            batch_size: batch_size.max(1),
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer_id.as_deref()
    }

    /// Statuses for `item_ids`. Items without an interaction are absent
    /// from the map; callers default them.
    pub async fn get_statuses(&self, item_ids: &[String]) -> HashMap<String, InteractionState> {
        let Some(viewer_id) = self.viewer_id.as_deref() else {
            return HashMap::new();
        };

        let mut statuses = HashMap::new();
        let mut missing = Vec::new();
        {
            let cache = self.cache.lock();
            for id in item_ids {
                match cache.get(id) {
                    Some(state) => {
                        if !state.is_empty() {
                            statuses.insert(id.clone(), *state);
                        }
                    }
                    None => missing.push(id.clone()),
                }
            }
        }

        if missing.is_empty() {
            return statuses;
        }

        let chunks: Vec<&[String]> = missing.chunks(self.batch_size).collect();
        debug!(
            viewer_id,
            requested = missing.len(),
            chunks = chunks.len(),
            "fetching interaction statuses"
        );

        let fetches = chunks.iter().map(|chunk| async move {
            let result =
                tokio::time::timeout(self.timeout, self.store.get_interactions(viewer_id, chunk))
                    .await;
            (*chunk, result)
        });

        let mut fetched = Vec::new();
        for (chunk, result) in join_all(fetches).await {
            match result {
                Ok(Ok(found)) => {
                    for id in chunk {
                        let state = found.get(id).copied().unwrap_or_default();
                        fetched.push((id.clone(), state));
                        if !state.is_empty() {
                            statuses.insert(id.clone(), state);
                        }
                    }
                }
                Ok(Err(err)) => {
                    warn!(
                        viewer_id,
                        chunk_len = chunk.len(),
                        error = %err,
                        "interaction status fetch failed"
                    );
                }
                Err(_) => {
                    warn!(
                        viewer_id,
                        chunk_len = chunk.len(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "interaction status fetch timed out"
                    );
                }
            }
        }
        self.cache.lock().extend(fetched);

        statuses
    }

    /// Attach interaction state to each item, preserving order.
    pub async fn annotate(&self, items: Vec<ContentItem>) -> Vec<FeedItem> {
        let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
        let statuses = self.get_statuses(&ids).await;
        items
            .into_iter()
            .map(|content| {
                let interaction = statuses.get(&content.id).copied().unwrap_or_default();
                FeedItem {
                    content,
                    interaction,
                }
            })
            .collect()
    }

    /// Record a committed state so later lookups skip the round trip.
    pub fn remember(&self, item_id: &str, state: InteractionState) {
        self.cache.lock().insert(item_id.to_string(), state);
    }

    pub fn cached(&self, item_id: &str) -> Option<InteractionState> {
        self.cache.lock().get(item_id).copied()
    }

    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }
}
