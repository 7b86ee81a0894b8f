//! Remote writes issued on behalf of a viewer.

use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ContentKind};
use crate::interaction::{InteractionState, Vote};

/// An atomic, idempotent write against the document store.
///
/// Votes are expressed as "set my vote to X" so that repeating a write never
/// double-counts. The store derives counter changes from the previous vote
/// record inside the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    SetVote {
        kind: ContentKind,
        item_id: String,
        viewer_id: String,
        vote: Vote,
    },
    SetFavorite {
        kind: ContentKind,
        item_id: String,
        viewer_id: String,
        favorite: bool,
    },
    DeleteItem {
        kind: ContentKind,
        item_id: String,
        requester_id: String,
    },
}

impl Mutation {
    pub fn item_id(&self) -> &str {
        match self {
            Mutation::SetVote { item_id, .. }
            | Mutation::SetFavorite { item_id, .. }
            | Mutation::DeleteItem { item_id, .. } => item_id,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Mutation::SetVote { kind, .. }
            | Mutation::SetFavorite { kind, .. }
            | Mutation::DeleteItem { kind, .. } => *kind,
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::SetVote { .. } => "set_vote",
            Mutation::SetFavorite { .. } => "set_favorite",
            Mutation::DeleteItem { .. } => "delete_item",
        }
    }
}

/// Records as they stand after a committed mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// The content item, or `None` when it was deleted.
    pub item: Option<ContentItem>,
    /// The viewer's interaction record, when the mutation touched one.
    pub interaction: Option<InteractionState>,
}
