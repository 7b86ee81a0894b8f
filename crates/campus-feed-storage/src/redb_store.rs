//! Embedded document store backed by redb.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use campus_feed_models::{
    ContentItem, ContentKind, InteractionState, Mutation, MutationOutcome, PageQuery,
};
use campus_feed_traits::{DocumentStore, StoreError, StoreResult};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use tracing::debug;

use crate::ops;

const POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("posts");
const EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("events");
const LOST_AND_FOUND: TableDefinition<&str, &[u8]> = TableDefinition::new("lost_and_found");
const INTERACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("interactions");

fn content_table(kind: ContentKind) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match kind {
        ContentKind::Post => POSTS,
        ContentKind::Event => EVENTS,
        ContentKind::LostAndFound => LOST_AND_FOUND,
    }
}

/// Map an internal error onto the store taxonomy, keeping domain errors
/// raised inside a transaction intact.
fn to_store_error(err: anyhow::Error) -> StoreError {
    err.downcast::<StoreError>()
        .unwrap_or_else(StoreError::backend)
}

/// Document store persisted in a single redb database.
#[derive(Debug, Clone)]
pub struct RedbDocumentStore {
    db: Arc<Database>,
}

impl RedbDocumentStore {
    /// Create tables if not exists.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        for kind in ContentKind::ALL {
            write_txn.open_table(content_table(kind))?;
        }
        write_txn.open_table(INTERACTIONS)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)
            .with_context(|| format!("Failed to open feed database at {}", path.display()))?;
        Self::new(Arc::new(db))
    }

    /// Insert or replace a content item.
    pub fn put_item(&self, item: &ContentItem) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(content_table(item.kind))?;
            let json_bytes = serde_json::to_vec(item)?;
            table.insert(item.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_item(&self, kind: ContentKind, id: &str) -> Result<Option<ContentItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(content_table(kind))?;

        if let Some(value) = table.get(id)? {
            Ok(Some(serde_json::from_slice(value.value())?))
        } else {
            Ok(None)
        }
    }

    /// Count items in a collection.
    pub fn count(&self, kind: ContentKind) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(content_table(kind))?;
        Ok(table.len()? as usize)
    }

    fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(content_table(kind))?;

        let mut items = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    fn read_batch(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> Result<HashMap<String, ContentItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(content_table(kind))?;

        let mut found = HashMap::new();
        for id in ids {
            if let Some(value) = table.get(id.as_str())? {
                let item: ContentItem = serde_json::from_slice(value.value())?;
                found.insert(id.clone(), item);
            }
        }
        Ok(found)
    }

    fn read_interactions(
        &self,
        viewer_id: &str,
        item_ids: &[String],
    ) -> Result<HashMap<String, InteractionState>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INTERACTIONS)?;

        let mut found = HashMap::new();
        for item_id in item_ids {
            let key = ops::interaction_key(viewer_id, item_id);
            if let Some(value) = table.get(key.as_str())? {
                let state: InteractionState = serde_json::from_slice(value.value())?;
                found.insert(item_id.clone(), state);
            }
        }
        Ok(found)
    }

    /// Apply a mutation inside one write transaction. Nothing is committed
    /// unless every record it touches was written.
    fn apply(&self, mutation: &Mutation) -> Result<MutationOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut items = write_txn.open_table(content_table(mutation.kind()))?;
            let item_id = mutation.item_id();
            let mut item: ContentItem = match items.get(item_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(ops::missing(item_id).into()),
            };

            match mutation {
                Mutation::SetVote {
                    viewer_id, vote, ..
                } => {
                    let mut interactions = write_txn.open_table(INTERACTIONS)?;
                    let key = ops::interaction_key(viewer_id, item_id);
                    let previous = match interactions.get(key.as_str())? {
                        Some(value) => serde_json::from_slice(value.value())?,
                        None => InteractionState::default(),
                    };
                    let state = ops::set_vote(&mut item, previous, *vote);
                    store_interaction(&mut interactions, &key, &state)?;
                    let json_bytes = serde_json::to_vec(&item)?;
                    items.insert(item_id, json_bytes.as_slice())?;
                    MutationOutcome {
                        item: Some(item),
                        interaction: Some(state),
                    }
                }
                Mutation::SetFavorite {
                    viewer_id,
                    favorite,
                    ..
                } => {
                    let mut interactions = write_txn.open_table(INTERACTIONS)?;
                    let key = ops::interaction_key(viewer_id, item_id);
                    let previous = match interactions.get(key.as_str())? {
                        Some(value) => serde_json::from_slice(value.value())?,
                        None => InteractionState::default(),
                    };
                    let state = ops::set_favorite(previous, *favorite);
                    store_interaction(&mut interactions, &key, &state)?;
                    MutationOutcome {
                        item: Some(item),
                        interaction: Some(state),
                    }
                }
                Mutation::DeleteItem { requester_id, .. } => {
                    ops::check_author(&item, requester_id)?;
                    items.remove(item_id)?;
                    MutationOutcome::default()
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }
}

/// Cleared interactions are removed rather than stored as empty records.
fn store_interaction(
    table: &mut redb::Table<'_, &'static str, &'static [u8]>,
    key: &str,
    state: &InteractionState,
) -> Result<()> {
    if state.is_empty() {
        table.remove(key)?;
    } else {
        let json_bytes = serde_json::to_vec(state)?;
        table.insert(key, json_bytes.as_slice())?;
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for RedbDocumentStore {
    async fn query(&self, query: &PageQuery) -> StoreResult<Vec<ContentItem>> {
        let items = self.list_items(query.kind).map_err(to_store_error)?;
        let page = ops::select_page(items, query)?;
        debug!(
            collection = query.kind.collection(),
            sort = %query.sort,
            returned = page.len(),
            "redb page query"
        );
        Ok(page)
    }

    async fn get_batch(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> StoreResult<HashMap<String, ContentItem>> {
        self.read_batch(kind, ids).map_err(to_store_error)
    }

    async fn get_interactions(
        &self,
        viewer_id: &str,
        item_ids: &[String],
    ) -> StoreResult<HashMap<String, InteractionState>> {
        self.read_interactions(viewer_id, item_ids)
            .map_err(to_store_error)
    }

    async fn mutate(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        let outcome = self.apply(&mutation).map_err(to_store_error)?;
        debug!(
            mutation = mutation.label(),
            item_id = mutation.item_id(),
            "redb mutation committed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_feed_models::{Cursor, SortKey, Vote};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    /// Returns both the store and the TempDir to ensure the directory
    /// is not deleted while the store is in use.
    fn test_store() -> (RedbDocumentStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("feed.redb");
        (RedbDocumentStore::open(db_path).unwrap(), dir)
    }

    fn post(id: &str, created_secs: i64) -> ContentItem {
        ContentItem::new(
            id,
            ContentKind::Post,
            "author-1",
            format!("Post {id}"),
            Utc.timestamp_opt(created_secs, 0).unwrap(),
        )
    }

    fn set_vote(item_id: &str, viewer_id: &str, vote: Vote) -> Mutation {
        Mutation::SetVote {
            kind: ContentKind::Post,
            item_id: item_id.to_string(),
            viewer_id: viewer_id.to_string(),
            vote,
        }
    }

    #[tokio::test]
    async fn test_paged_query_walks_whole_collection() {
        let (store, _temp_dir) = test_store();
        for i in 0..7 {
            store.put_item(&post(&format!("p{i}"), i)).unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let query =
                PageQuery::first(ContentKind::Post, SortKey::Newest, 3).after(cursor.clone());
            let page = store.query(&query).await.unwrap();
            if page.is_empty() {
                break;
            }
            cursor = page.last().map(|item| Cursor::at(SortKey::Newest, item));
            seen.extend(page.into_iter().map(|item| item.id));
        }

        assert_eq!(seen, ["p6", "p5", "p4", "p3", "p2", "p1", "p0"]);
    }

    #[tokio::test]
    async fn test_vote_updates_counters_and_record_together() {
        let (store, _temp_dir) = test_store();
        store.put_item(&post("p1", 1)).unwrap();

        store.mutate(set_vote("p1", "v1", Vote::Up)).await.unwrap();
        let outcome = store.mutate(set_vote("p1", "v1", Vote::Down)).await.unwrap();

        let item = outcome.item.unwrap();
        assert_eq!((item.upvotes, item.downvotes, item.score), (0, 1, -1));

        let persisted = store.get_item(ContentKind::Post, "p1").unwrap().unwrap();
        assert_eq!(persisted, item);

        let statuses = store
            .get_interactions("v1", &["p1".to_string()])
            .await
            .unwrap();
        assert_eq!(statuses["p1"].vote, Vote::Down);
    }

    #[tokio::test]
    async fn test_clearing_vote_removes_interaction_record() {
        let (store, _temp_dir) = test_store();
        store.put_item(&post("p1", 1)).unwrap();

        store.mutate(set_vote("p1", "v1", Vote::Up)).await.unwrap();
        store.mutate(set_vote("p1", "v1", Vote::None)).await.unwrap();

        let statuses = store
            .get_interactions("v1", &["p1".to_string()])
            .await
            .unwrap();
        assert!(statuses.is_empty());
    }

    #[tokio::test]
    async fn test_vote_on_missing_item_is_not_found() {
        let (store, _temp_dir) = test_store();
        let err = store
            .mutate(set_vote("ghost", "v1", Vote::Up))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_author() {
        let (store, _temp_dir) = test_store();
        store.put_item(&post("p1", 1)).unwrap();

        let denied = store
            .mutate(Mutation::DeleteItem {
                kind: ContentKind::Post,
                item_id: "p1".to_string(),
                requester_id: "intruder".to_string(),
            })
            .await
            .unwrap_err();
        assert!(denied.is_permission_denied());
        assert_eq!(store.count(ContentKind::Post).unwrap(), 1);

        store
            .mutate(Mutation::DeleteItem {
                kind: ContentKind::Post,
                item_id: "p1".to_string(),
                requester_id: "author-1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(store.count(ContentKind::Post).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_batch_skips_unknown_ids() {
        let (store, _temp_dir) = test_store();
        store.put_item(&post("p1", 1)).unwrap();

        let found = store
            .get_batch(ContentKind::Post, &["p1".to_string(), "p9".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("p1"));
    }

    #[tokio::test]
    async fn test_colon_ids_do_not_share_interaction_records() {
        let (store, _temp_dir) = test_store();
        store.put_item(&post("c", 1)).unwrap();
        store.put_item(&post("b:c", 2)).unwrap();

        store.mutate(set_vote("c", "a:b", Vote::Up)).await.unwrap();
        let found = store
            .get_interactions("a", &["b:c".to_string()])
            .await
            .unwrap();
        assert!(found.is_empty());

        let outcome = store.mutate(set_vote("b:c", "a", Vote::Down)).await.unwrap();
        let item = outcome.item.unwrap();
        assert_eq!((item.upvotes, item.downvotes, item.score), (0, 1, -1));

        let original = store.get_item(ContentKind::Post, "c").unwrap().unwrap();
        assert_eq!((original.upvotes, original.downvotes), (1, 0));
    }
}
