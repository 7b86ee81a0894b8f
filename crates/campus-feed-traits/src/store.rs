//! Document store abstraction.
//!
//! Implementations are provided by downstream crates (e.g.,
//! campus-feed-storage). The feed engine only ever talks to this trait.

use std::collections::HashMap;

use async_trait::async_trait;
use campus_feed_models::{
    ContentItem, ContentKind, InteractionState, Mutation, MutationOutcome, PageQuery,
};

use crate::error::Result;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Items of `query.kind` in `query.sort` order, strictly after
    /// `query.after`, at most `query.limit` of them.
    async fn query(&self, query: &PageQuery) -> Result<Vec<ContentItem>>;

    /// Items by id. Unknown ids are absent from the map.
    async fn get_batch(
        &self,
        kind: ContentKind,
        ids: &[String],
    ) -> Result<HashMap<String, ContentItem>>;

    /// Interaction records for one viewer. Items the viewer never touched
    /// are absent from the map.
    async fn get_interactions(
        &self,
        viewer_id: &str,
        item_ids: &[String],
    ) -> Result<HashMap<String, InteractionState>>;

    /// Apply `mutation` atomically.
    async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome>;
}
