//! Store wrapper with failure injection and pausable calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use campus_feed_models::{
    ContentItem, ContentKind, InteractionState, Mutation, MutationOutcome, PageQuery,
};
use campus_feed_storage::MemoryDocumentStore;
use campus_feed_traits::{DocumentStore, StoreError, StoreResult};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// A pause point: while `paused`, each call waits for one released permit.
pub struct Gate {
    paused: AtomicBool,
    permits: Semaphore,
    waiting: AtomicUsize,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            paused: AtomicBool::new(false),
            permits: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }
}

impl Gate {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Let one paused call through.
    pub fn release_one(&self) {
        self.permits.add_permits(1);
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    async fn pass(&self) {
        if !self.paused.load(Ordering::SeqCst) {
            return;
        }
        self.waiting.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }

    /// Yield until `count` calls are parked at the gate.
    pub async fn wait_for(&self, count: usize) {
        while self.waiting() < count {
            tokio::task::yield_now().await;
        }
    }
}

pub struct ScriptedStore {
    pub inner: MemoryDocumentStore,
    pub query_gate: Gate,
    pub mutate_gate: Gate,
    pub queries: AtomicUsize,
    pub mutations: AtomicUsize,
    pub status_calls: AtomicUsize,
    fail_queries: Mutex<Vec<StoreError>>,
    fail_mutations: Mutex<Vec<StoreError>>,
    fail_statuses: AtomicBool,
    pub seen_queries: Mutex<Vec<PageQuery>>,
}

impl ScriptedStore {
    pub fn new(inner: MemoryDocumentStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            query_gate: Gate::default(),
            mutate_gate: Gate::default(),
            queries: AtomicUsize::new(0),
            mutations: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            fail_queries: Mutex::new(Vec::new()),
            fail_mutations: Mutex::new(Vec::new()),
            fail_statuses: AtomicBool::new(false),
            seen_queries: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_next_query(&self, err: StoreError) {
        self.fail_queries.lock().push(err);
    }

    pub fn fail_next_mutation(&self, err: StoreError) {
        self.fail_mutations.lock().push(err);
    }

    pub fn fail_statuses(&self, fail: bool) {
        self.fail_statuses.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn query(&self, query: &PageQuery) -> StoreResult<Vec<ContentItem>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.seen_queries.lock().push(query.clone());
        self.query_gate.pass().await;
        if let Some(err) = self.fail_queries.lock().pop() {
            return Err(err);
        }
        self.inner.query(query).await
    }

    async fn get_batch(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> StoreResult<HashMap<String, ContentItem>> {
        self.inner.get_batch(kind, ids).await
    }

    async fn get_interactions(
        &self,
        viewer_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashMap<String, InteractionState>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_statuses.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("status backend down".into()));
        }
        self.inner.get_interactions(viewer_id, item_ids).await
    }

    async fn mutate(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.mutate_gate.pass().await;
        if let Some(err) = self.fail_mutations.lock().pop() {
            return Err(err);
        }
        self.inner.mutate(mutation).await
    }
}

/// Post `p{i:03}` created `i` seconds after a fixed epoch.
pub fn post(i: i64) -> ContentItem {
    ContentItem::new(
        format!("p{i:03}"),
        ContentKind::Post,
        "author-1",
        format!("Post {i}"),
        Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
    )
}

pub fn posts(count: i64) -> Vec<ContentItem> {
    (1..=count).map(post).collect()
}
