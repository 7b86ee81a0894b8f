//! Campus Feed Models - plain data shared by every layer.
//!
//! - Content items and their collections
//! - Visibility descriptors and viewer profiles
//! - Per-viewer interaction state and the vote transition table
//! - Sort keys, cursors and page queries
//! - Remote mutations issued by the optimistic mutator

pub mod content;
pub mod interaction;
pub mod mutation;
pub mod query;
pub mod visibility;

pub use content::{AuthorAttributes, ContentItem, ContentKind, FeedItem};
pub use interaction::{CounterDelta, InteractionState, Vote, VoteAction};
pub use mutation::{Mutation, MutationOutcome};
pub use query::{Cursor, PageQuery, SortKey};
pub use visibility::{Viewer, ViewerProfile, VisibilitySettings};
