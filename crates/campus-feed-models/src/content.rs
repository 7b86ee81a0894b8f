//! Content items as stored remotely and as held by a feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::interaction::{CounterDelta, InteractionState};
use crate::visibility::VisibilitySettings;

/// Collection a content item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ContentKind {
    Post,
    Event,
    LostAndFound,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::Post,
        ContentKind::Event,
        ContentKind::LostAndFound,
    ];

    /// Remote collection name.
    pub fn collection(&self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Event => "events",
            ContentKind::LostAndFound => "lost_and_found",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.collection() == name)
    }
}

/// Denormalized author attributes copied onto each item for tagging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthorAttributes {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub year_of_passing: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// A post, event or lost-and-found record as owned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub author_id: String,
    #[serde(default)]
    pub author: AuthorAttributes,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub visibility: VisibilitySettings,
}

impl ContentItem {
    pub fn new(
        id: impl Into<String>,
        kind: ContentKind,
        author_id: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            author_id: author_id.into(),
            author: AuthorAttributes::default(),
            title: title.into(),
            body: String::new(),
            event_at: None,
            created_at,
            upvotes: 0,
            downvotes: 0,
            score: 0,
            visibility: VisibilitySettings::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: VisibilitySettings) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_counters(mut self, upvotes: i64, downvotes: i64) -> Self {
        self.upvotes = upvotes;
        self.downvotes = downvotes;
        self.score = upvotes - downvotes;
        self
    }

    /// Apply a counter delta, keeping `score` equal to `upvotes - downvotes`.
    pub fn apply_delta(&mut self, delta: CounterDelta) {
        self.upvotes += delta.upvotes;
        self.downvotes += delta.downvotes;
        self.score = self.upvotes - self.downvotes;
    }
}

/// A content item as held by a feed: the cached remote copy plus the
/// viewer's merged interaction state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FeedItem {
    #[serde(flatten)]
    pub content: ContentItem,
    #[serde(default)]
    pub interaction: InteractionState,
}

impl FeedItem {
    pub fn new(content: ContentItem) -> Self {
        Self {
            content,
            interaction: InteractionState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.content.id
    }
}
