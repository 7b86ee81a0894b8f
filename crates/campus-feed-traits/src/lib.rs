//! Campus Feed Traits - collaborator seams consumed by the feed engine.
//!
//! - `DocumentStore`: paged queries, batch reads, interaction lookups and
//!   atomic mutations
//! - `IdentityProvider`: the current session and viewer
//! - `StoreError`: failure taxonomy shared by every store implementation

pub mod error;
pub mod identity;
pub mod store;

pub use error::{Result as StoreResult, StoreError};
pub use identity::{IdentityProvider, SessionState};
pub use store::DocumentStore;
