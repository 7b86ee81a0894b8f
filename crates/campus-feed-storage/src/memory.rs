//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use campus_feed_models::{
    ContentItem, ContentKind, InteractionState, Mutation, MutationOutcome, PageQuery,
};
use campus_feed_traits::{DocumentStore, StoreResult};
use parking_lot::RwLock;

use crate::ops;

#[derive(Default)]
struct Collections {
    items: HashMap<ContentKind, BTreeMap<String, ContentItem>>,
    interactions: HashMap<String, InteractionState>,
}

/// Document store held entirely in memory. A single lock guards every
/// collection, so each mutation is atomic.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ContentItem>,
    {
        let store = Self::new();
        for item in items {
            store.put_item(item);
        }
        store
    }

    pub fn put_item(&self, item: ContentItem) {
        self.inner
            .write()
            .items
            .entry(item.kind)
            .or_default()
            .insert(item.id.clone(), item);
    }

    pub fn get_item(&self, kind: ContentKind, id: &str) -> Option<ContentItem> {
        self.inner
            .read()
            .items
            .get(&kind)
            .and_then(|items| items.get(id))
            .cloned()
    }

    pub fn interaction(&self, viewer_id: &str, item_id: &str) -> Option<InteractionState> {
        self.inner
            .read()
            .interactions
            .get(&ops::interaction_key(viewer_id, item_id))
            .copied()
    }

    fn apply(&self, mutation: &Mutation) -> StoreResult<MutationOutcome> {
        let mut guard = self.inner.write();
        let Collections {
            items,
            interactions,
        } = &mut *guard;
        let item_id = mutation.item_id();
        let collection = items.entry(mutation.kind()).or_default();
        let Some(current) = collection.get(item_id) else {
            return Err(ops::missing(item_id));
        };

        match mutation {
            Mutation::SetVote {
                viewer_id, vote, ..
            } => {
                let key = ops::interaction_key(viewer_id, item_id);
                let previous = interactions.get(&key).copied().unwrap_or_default();
                let mut item = current.clone();
                let state = ops::set_vote(&mut item, previous, *vote);
                store_interaction(interactions, key, state);
                collection.insert(item_id.to_string(), item.clone());
                Ok(MutationOutcome {
                    item: Some(item),
                    interaction: Some(state),
                })
            }
            Mutation::SetFavorite {
                viewer_id,
                favorite,
                ..
            } => {
                let key = ops::interaction_key(viewer_id, item_id);
                let previous = interactions.get(&key).copied().unwrap_or_default();
                let state = ops::set_favorite(previous, *favorite);
                let item = current.clone();
                store_interaction(interactions, key, state);
                Ok(MutationOutcome {
                    item: Some(item),
                    interaction: Some(state),
                })
            }
            Mutation::DeleteItem { requester_id, .. } => {
                ops::check_author(current, requester_id)?;
                collection.remove(item_id);
                Ok(MutationOutcome::default())
            }
        }
    }
}

fn store_interaction(
    interactions: &mut HashMap<String, InteractionState>,
    key: String,
    state: InteractionState,
) {
    if state.is_empty() {
        interactions.remove(&key);
    } else {
        interactions.insert(key, state);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &PageQuery) -> StoreResult<Vec<ContentItem>> {
        let candidates: Vec<ContentItem> = self
            .inner
            .read()
            .items
            .get(&query.kind)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default();
        ops::select_page(candidates, query)
    }

    async fn get_batch(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> StoreResult<HashMap<String, ContentItem>> {
        let guard = self.inner.read();
        let Some(items) = guard.items.get(&kind) else {
            return Ok(HashMap::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id).map(|item| (id.clone(), item.clone())))
            .collect())
    }

    async fn get_interactions(
        &self,
        viewer_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashMap<String, InteractionState>> {
        let guard = self.inner.read();
        Ok(item_ids
            .iter()
            .filter_map(|item_id| {
                guard
                    .interactions
                    .get(&ops::interaction_key(viewer_id, item_id))
                    .map(|state| (item_id.clone(), *state))
            })
            .collect())
    }

    async fn mutate(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        self.apply(&mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_feed_models::{SortKey, Vote};
    use chrono::{TimeZone, Utc};

    fn post(id: &str, created_secs: i64) -> ContentItem {
        ContentItem::new(
            id,
            ContentKind::Post,
            "author-1",
            id,
            Utc.timestamp_opt(created_secs, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let event = ContentItem::new("e1", ContentKind::Event, "a", "Fest", Utc::now());
        let store = MemoryDocumentStore::with_items([post("p1", 1), event]);

        let posts = store
            .query(&PageQuery::first(ContentKind::Post, SortKey::Newest, 10))
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "p1");

        let lost = store
            .query(&PageQuery::first(ContentKind::LostAndFound, SortKey::Newest, 10))
            .await
            .unwrap();
        assert!(lost.is_empty());
    }

    #[tokio::test]
    async fn test_favorite_leaves_counters_alone() {
        let store = MemoryDocumentStore::with_items([post("p1", 1).with_counters(2, 1)]);
        store
            .mutate(Mutation::SetFavorite {
                kind: ContentKind::Post,
                item_id: "p1".to_string(),
                viewer_id: "v1".to_string(),
                favorite: true,
            })
            .await
            .unwrap();

        let item = store.get_item(ContentKind::Post, "p1").unwrap();
        assert_eq!((item.upvotes, item.downvotes), (2, 1));
        let state = store.interaction("v1", "p1").unwrap();
        assert!(state.favorite);
        assert_eq!(state.vote, Vote::None);
    }

    #[tokio::test]
    async fn test_votes_from_different_viewers_accumulate() {
        let store = MemoryDocumentStore::with_items([post("p1", 1)]);
        for viewer in ["v1", "v2", "v3"] {
            store
                .mutate(Mutation::SetVote {
                    kind: ContentKind::Post,
                    item_id: "p1".to_string(),
                    viewer_id: viewer.to_string(),
                    vote: Vote::Up,
                })
                .await
                .unwrap();
        }
        let item = store.get_item(ContentKind::Post, "p1").unwrap();
        assert_eq!(item.upvotes, 3);
        assert_eq!(item.score, 3);
    }

    #[tokio::test]
    async fn test_colon_ids_do_not_share_interaction_records() {
        let store = MemoryDocumentStore::with_items([post("c", 1), post("b:c", 2)]);
        store
            .mutate(Mutation::SetVote {
                kind: ContentKind::Post,
                item_id: "c".to_string(),
                viewer_id: "a:b".to_string(),
                vote: Vote::Up,
            })
            .await
            .unwrap();

        let found = store
            .get_interactions("a", &["b:c".to_string()])
            .await
            .unwrap();
        assert!(found.is_empty());

        store
            .mutate(Mutation::SetVote {
                kind: ContentKind::Post,
                item_id: "b:c".to_string(),
                viewer_id: "a".to_string(),
                vote: Vote::Down,
            })
            .await
            .unwrap();
        let item = store.get_item(ContentKind::Post, "b:c").unwrap();
        assert_eq!((item.upvotes, item.downvotes), (0, 1));
        assert_eq!(store.interaction("a:b", "c").unwrap().vote, Vote::Up);
    }
}
