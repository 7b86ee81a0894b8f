//! Cursor-paginated, visibility-filtered feed.
//!
//! One `FeedPager` backs one feed view. Pages are fetched one at a time:
//! a load request that arrives while a page is in flight is a no-op. Each
//! fetch is tagged with the sort key and epoch it was issued under, and a
//! response whose tag no longer matches (sort change, refresh) is dropped
//! instead of merged.
//!
//! Every page asks the store for `page_size + 1` items. The extra item only
//! signals that more data exists and is never shown. `has_more` always
//! describes the unfiltered remote sequence; visibility filtering happens
//! afterwards and does not influence it.

use std::sync::Arc;
use std::time::Duration;

use campus_feed_models::{ContentKind, Cursor, FeedItem, PageQuery, SortKey, Viewer};
use campus_feed_traits::DocumentStore;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::interactions::InteractionStore;
use crate::visibility::{self, Audience};

/// Pager lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    Idle,
    LoadingInitial,
    LoadingMore,
    Exhausted,
    Errored,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::LoadingInitial | FeedState::LoadingMore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    More,
}

impl Phase {
    fn loading_state(self) -> FeedState {
        match self {
            Phase::Initial => FeedState::LoadingInitial,
            Phase::More => FeedState::LoadingMore,
        }
    }
}

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged into the feed.
    Loaded { appended: usize, has_more: bool },
    /// Nothing to do: a page is already in flight, the feed is exhausted,
    /// or it is errored and waiting for `retry`.
    Skipped,
    /// The response belonged to an earlier sort key or epoch.
    Discarded,
}

/// Renderable view of the feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub kind: ContentKind,
    pub sort: SortKey,
    pub state: FeedState,
    pub has_more: bool,
    pub items: Vec<FeedItem>,
    pub error: Option<String>,
}

struct FeedInner {
    state: FeedState,
    sort: SortKey,
    epoch: u64,
    cursor: Option<Cursor>,
    items: Vec<FeedItem>,
    has_more: bool,
    failed_phase: Option<Phase>,
    last_error: Option<FeedError>,
}

impl FeedInner {
    fn new(sort: SortKey) -> Self {
        Self {
            state: FeedState::Idle,
            sort,
            epoch: 0,
            cursor: None,
            items: Vec::new(),
            has_more: true,
            failed_phase: None,
            last_error: None,
        }
    }

    /// Drop accumulated results and start a new epoch; any in-flight fetch
    /// becomes stale.
    fn restart(&mut self) {
        self.epoch += 1;
        self.state = FeedState::Idle;
        self.cursor = None;
        self.items.clear();
        self.has_more = true;
        self.failed_phase = None;
        self.last_error = None;
    }
}

/// Identifies the feed generation a fetch was issued for.
#[derive(Debug, Clone)]
struct Ticket {
    phase: Phase,
    epoch: u64,
    sort: SortKey,
    cursor: Option<Cursor>,
}

pub struct FeedPager {
    kind: ContentKind,
    viewer: Option<Viewer>,
    store: Arc<dyn DocumentStore>,
    interactions: Arc<InteractionStore>,
    page_size: usize,
    fetch_timeout: Duration,
    inner: Mutex<FeedInner>,
}

impl FeedPager {
    pub fn new(
        kind: ContentKind,
        store: Arc<dyn DocumentStore>,
        viewer: Option<Viewer>,
        config: &FeedConfig,
    ) -> Self {
        let interactions = Arc::new(InteractionStore::new(
            store.clone(),
            viewer.as_ref().map(|viewer| viewer.id.clone()),
            config.status_batch_size,
            config.fetch_timeout(),
        ));
        Self {
            kind,
            viewer,
            store,
            interactions,
            page_size: config.page_size.max(1),
            fetch_timeout: config.fetch_timeout(),
            inner: Mutex::new(FeedInner::new(SortKey::default())),
        }
    }

    /// Start with `sort` instead of the default order.
    pub fn with_sort(self, sort: SortKey) -> Self {
        self.inner.lock().sort = sort;
        self
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn interactions(&self) -> &Arc<InteractionStore> {
        &self.interactions
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load the first page, replacing anything already shown.
    pub async fn load_initial(&self) -> Result<LoadOutcome, FeedError> {
        self.run(Phase::Initial).await
    }

    /// Load the next page. Before the first page has loaded this behaves
    /// like `load_initial`. An errored feed waits for `retry`; an exhausted
    /// one only restarts through `refresh` or `set_sort`.
    pub async fn load_more(&self) -> Result<LoadOutcome, FeedError> {
        let phase = {
            let inner = self.inner.lock();
            if matches!(inner.state, FeedState::Errored | FeedState::Exhausted) {
                return Ok(LoadOutcome::Skipped);
            }
            if inner.cursor.is_none() && inner.items.is_empty() {
                Phase::Initial
            } else {
                Phase::More
            }
        };
        self.run(phase).await
    }

    /// Re-issue the fetch that failed. No-op unless the feed is errored.
    pub async fn retry(&self) -> Result<LoadOutcome, FeedError> {
        let phase = {
            let mut inner = self.inner.lock();
            match (inner.state, inner.failed_phase) {
                (FeedState::Errored, Some(phase)) => {
                    inner.state = FeedState::Idle;
                    phase
                }
                _ => return Ok(LoadOutcome::Skipped),
            }
        };
        self.run(phase).await
    }

    /// Discard everything and reload from the top under the same sort key.
    /// Cached interaction state is dropped too, so votes cast elsewhere
    /// show up.
    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        {
            let mut inner = self.inner.lock();
            inner.restart();
            self.interactions.invalidate();
            info!(collection = self.kind.collection(), epoch = inner.epoch, "feed refreshed");
        }
        self.run(Phase::Initial).await
    }

    /// Switch the sort key. Accumulated items and the cursor are discarded
    /// and pagination restarts; a fetch still in flight for the old key is
    /// ignored when it lands.
    pub async fn set_sort(&self, sort: SortKey) -> Result<LoadOutcome, FeedError> {
        {
            let mut inner = self.inner.lock();
            if inner.sort == sort {
                return Ok(LoadOutcome::Skipped);
            }
            let previous = inner.sort;
            inner.sort = sort;
            inner.restart();
            self.interactions.invalidate();
            info!(
                collection = self.kind.collection(),
                from = %previous,
                to = %sort,
                epoch = inner.epoch,
                "feed sort changed"
            );
        }
        self.run(Phase::Initial).await
    }

    fn begin(&self, phase: Phase) -> Option<Ticket> {
        let mut inner = self.inner.lock();
        match inner.state {
            FeedState::LoadingInitial | FeedState::LoadingMore => return None,
            FeedState::Exhausted | FeedState::Errored if phase == Phase::More => return None,
            _ => {}
        }

        inner.state = phase.loading_state();
        inner.last_error = None;
        Some(Ticket {
            phase,
            epoch: inner.epoch,
            sort: inner.sort,
            cursor: match phase {
                Phase::Initial => None,
                Phase::More => inner.cursor.clone(),
            },
        })
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        let inner = self.inner.lock();
        inner.epoch == ticket.epoch && inner.sort == ticket.sort
    }

    async fn run(&self, phase: Phase) -> Result<LoadOutcome, FeedError> {
        let Some(ticket) = self.begin(phase) else {
            debug!(collection = self.kind.collection(), "load request ignored");
            return Ok(LoadOutcome::Skipped);
        };

        let query = PageQuery {
            kind: self.kind,
            sort: ticket.sort,
            after: ticket.cursor.clone(),
            limit: self.page_size + 1,
        };
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.store.query(&query)).await
        {
            Ok(Ok(items)) => Ok(items),
            Ok(Err(err)) => Err(FeedError::Fetch(err)),
            Err(_) => Err(FeedError::Timeout(self.fetch_timeout)),
        };

        let mut candidates = match fetched {
            Ok(items) => items,
            Err(err) => return self.fail(&ticket, err),
        };

        let has_more = candidates.len() > self.page_size;
        candidates.truncate(self.page_size);
        let cursor = candidates
            .last()
            .map(|item| Cursor::at(ticket.sort, item))
            .or_else(|| ticket.cursor.clone());
        let unfiltered = candidates.len();

        visibility::retain_visible(&mut candidates, Audience::of(self.viewer.as_ref()));
        debug!(
            collection = self.kind.collection(),
            epoch = ticket.epoch,
            unfiltered,
            visible = candidates.len(),
            has_more,
            "page fetched"
        );

        if !self.is_current(&ticket) {
            return Ok(self.discard(&ticket));
        }
        let annotated = self.interactions.annotate(candidates).await;

        let mut inner = self.inner.lock();
        if inner.epoch != ticket.epoch || inner.sort != ticket.sort {
            drop(inner);
            return Ok(self.discard(&ticket));
        }

        let appended = annotated.len();
        match ticket.phase {
            Phase::Initial => inner.items = annotated,
            Phase::More => inner.items.extend(annotated),
        }
        inner.cursor = cursor;
        inner.has_more = has_more;
        inner.failed_phase = None;
        inner.state = if has_more {
            FeedState::Idle
        } else {
            info!(
                collection = self.kind.collection(),
                total = inner.items.len(),
                "feed exhausted"
            );
            FeedState::Exhausted
        };

        Ok(LoadOutcome::Loaded { appended, has_more })
    }

    fn fail(&self, ticket: &Ticket, err: FeedError) -> Result<LoadOutcome, FeedError> {
        let mut inner = self.inner.lock();
        if inner.epoch != ticket.epoch || inner.sort != ticket.sort {
            drop(inner);
            return Ok(self.discard(ticket));
        }
        warn!(
            collection = self.kind.collection(),
            error = %err,
            retryable = err.is_retryable(),
            "page fetch failed"
        );
        inner.state = FeedState::Errored;
        inner.failed_phase = Some(ticket.phase);
        inner.last_error = Some(err.clone());
        Err(err)
    }

    fn discard(&self, ticket: &Ticket) -> LoadOutcome {
        warn!(
            collection = self.kind.collection(),
            epoch = ticket.epoch,
            sort = %ticket.sort,
            "discarding stale page response"
        );
        LoadOutcome::Discarded
    }

    /// Re-read canonical records for already loaded items, keeping their
    /// merged interaction state. Returns how many items were updated.
    pub async fn refresh_items(&self, ids: &[String]) -> Result<usize, FeedError> {
        let fetched =
            match tokio::time::timeout(self.fetch_timeout, self.store.get_batch(self.kind, ids))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(FeedError::Timeout(self.fetch_timeout)),
            };

        let mut inner = self.inner.lock();
        let mut updated = 0;
        for item in inner.items.iter_mut() {
            if let Some(content) = fetched.get(&item.content.id) {
                item.content = content.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    // ── Item update hook ─────────────────────────────────────────────

    pub fn item(&self, id: &str) -> Option<FeedItem> {
        self.inner
            .lock()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Mutate a loaded item in place, returning its new value.
    pub fn update_item<F>(&self, id: &str, update: F) -> Option<FeedItem>
    where
        F: FnOnce(&mut FeedItem),
    {
        let mut inner = self.inner.lock();
        let item = inner.items.iter_mut().find(|item| item.id() == id)?;
        update(item);
        Some(item.clone())
    }

    /// Overwrite a loaded item with `replacement`. Returns false if the item
    /// is no longer in the feed.
    pub fn replace_item(&self, replacement: FeedItem) -> bool {
        self.update_item(&replacement.content.id.clone(), |item| *item = replacement)
            .is_some()
    }

    /// Remove a loaded item, returning its former index and value.
    pub fn remove_item(&self, id: &str) -> Option<(usize, FeedItem)> {
        let mut inner = self.inner.lock();
        let index = inner.items.iter().position(|item| item.id() == id)?;
        Some((index, inner.items.remove(index)))
    }

    /// Put an item back at `index` (clamped to the current length).
    pub fn insert_item(&self, index: usize, item: FeedItem) {
        let mut inner = self.inner.lock();
        let index = index.min(inner.items.len());
        inner.items.insert(index, item);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> FeedState {
        self.inner.lock().state
    }

    pub fn sort(&self) -> SortKey {
        self.inner.lock().sort
    }

    /// Generation counter bumped on every sort change and refresh.
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    pub fn has_more(&self) -> bool {
        self.inner.lock().has_more
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.inner.lock().cursor.clone()
    }

    pub fn last_error(&self) -> Option<FeedError> {
        self.inner.lock().last_error.clone()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.inner.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn last_item_id(&self) -> Option<String> {
        self.inner
            .lock()
            .items
            .last()
            .map(|item| item.content.id.clone())
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.inner.lock();
        FeedSnapshot {
            kind: self.kind,
            sort: inner.sort,
            state: inner.state,
            has_more: inner.has_more,
            items: inner.items.clone(),
            error: inner
                .last_error
                .as_ref()
                .map(|err| err.user_message().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_feed_models::{ContentItem, ViewerProfile, VisibilitySettings};
    use campus_feed_storage::MemoryDocumentStore;
    use chrono::{TimeZone, Utc};

    fn post(i: i64) -> ContentItem {
        ContentItem::new(
            format!("p{i:02}"),
            ContentKind::Post,
            "author",
            format!("Post {i}"),
            Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
        )
    }

    fn pager_over(count: i64) -> FeedPager {
        let store = MemoryDocumentStore::with_items((1..=count).map(post));
        FeedPager::new(
            ContentKind::Post,
            Arc::new(store),
            None,
            &FeedConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_eleven_items_yield_ten_and_more() {
        let pager = pager_over(11);
        let outcome = pager.load_initial().await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                appended: 10,
                has_more: true
            }
        );
        assert_eq!(pager.state(), FeedState::Idle);
        assert_eq!(pager.len(), 10);
        // Newest first: p11 .. p02, so the tenth item is p02.
        assert_eq!(pager.cursor().unwrap().item_id(), "p02");
        assert_eq!(pager.last_item_id().as_deref(), Some("p02"));
    }

    #[tokio::test]
    async fn test_short_page_exhausts_feed() {
        let pager = pager_over(4);
        pager.load_initial().await.unwrap();
        assert_eq!(pager.state(), FeedState::Exhausted);
        assert!(!pager.has_more());
        assert_eq!(pager.cursor().unwrap().item_id(), "p01");

        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_empty_collection_has_no_cursor() {
        let pager = pager_over(0);
        pager.load_initial().await.unwrap();
        assert_eq!(pager.state(), FeedState::Exhausted);
        assert!(pager.cursor().is_none());
        assert!(pager.is_empty());

        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(pager.state(), FeedState::Exhausted);
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let pager = pager_over(25);
        pager.load_more().await.unwrap();
        pager.load_more().await.unwrap();
        let outcome = pager.load_more().await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                appended: 5,
                has_more: false
            }
        );
        let ids: Vec<String> = pager.items().into_iter().map(|i| i.content.id).collect();
        let expected: Vec<String> = (1..=25).rev().map(|i| format!("p{i:02}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_filtering_does_not_end_pagination() {
        let hidden = VisibilitySettings::default().with_branches(["ECE"]);
        let store = MemoryDocumentStore::with_items(
            (1..=15).map(|i| post(i).with_visibility(hidden.clone())),
        );
        let viewer = Viewer::new("v1", ViewerProfile::new("CSE", 2026, "F"));
        let pager = FeedPager::new(
            ContentKind::Post,
            Arc::new(store),
            Some(viewer),
            &FeedConfig::default(),
        );

        let outcome = pager.load_initial().await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                appended: 0,
                has_more: true
            }
        );
        assert_eq!(pager.state(), FeedState::Idle);
        assert!(pager.cursor().is_some());
    }

    #[tokio::test]
    async fn test_anonymous_viewer_sees_only_unrestricted() {
        let store = MemoryDocumentStore::with_items([
            post(1),
            post(2).with_visibility(VisibilitySettings::default().with_years([2026])),
        ]);
        let pager = FeedPager::new(
            ContentKind::Post,
            Arc::new(store),
            Some(Viewer::without_profile("v1")),
            &FeedConfig::default(),
        );
        pager.load_initial().await.unwrap();
        let ids: Vec<String> = pager.items().into_iter().map(|i| i.content.id).collect();
        assert_eq!(ids, ["p01"]);
    }

    #[tokio::test]
    async fn test_update_remove_and_insert_items() {
        let pager = pager_over(3);
        pager.load_initial().await.unwrap();

        let updated = pager
            .update_item("p02", |item| item.interaction.favorite = true)
            .unwrap();
        assert!(updated.interaction.favorite);
        assert!(pager.update_item("missing", |_| {}).is_none());

        let (index, removed) = pager.remove_item("p02").unwrap();
        assert_eq!(index, 1);
        assert_eq!(pager.len(), 2);

        pager.insert_item(index, removed.clone());
        assert_eq!(pager.items()[1], removed);
    }

    #[tokio::test]
    async fn test_same_sort_is_a_no_op() {
        let pager = pager_over(3);
        pager.load_initial().await.unwrap();
        let epoch = pager.epoch();
        assert_eq!(
            pager.set_sort(SortKey::Newest).await.unwrap(),
            LoadOutcome::Skipped
        );
        assert_eq!(pager.epoch(), epoch);
        assert_eq!(pager.len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_state() {
        let pager = pager_over(2).with_sort(SortKey::TopScore);
        pager.load_initial().await.unwrap();
        let snapshot = pager.snapshot();
        assert_eq!(snapshot.sort, SortKey::TopScore);
        assert_eq!(snapshot.state, FeedState::Exhausted);
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.error.is_none());
    }
}
