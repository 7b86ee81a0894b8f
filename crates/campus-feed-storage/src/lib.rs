//! Campus Feed Storage - document store implementations.
//!
//! Both stores implement `campus_feed_traits::DocumentStore` with the same
//! semantics: cursor-resumed sorted pages, per-viewer interaction records
//! keyed by `(viewer_id, item_id)`, and vote writes that update the item's
//! counters and the viewer's record in a single atomic step.
//!
//! # Tables (redb)
//!
//! - `posts`, `events`, `lost_and_found` - content items as JSON
//! - `interactions` - `"{viewer_id.len()}:{viewer_id}:{item_id}"` to
//!   interaction state as JSON

pub mod memory;
pub mod redb_store;

mod ops;

pub use memory::MemoryDocumentStore;
pub use redb_store::RedbDocumentStore;
