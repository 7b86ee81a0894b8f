//! Campus Feed Core - the paginated, visibility-filtered feed engine.
//!
//! A feed view is assembled from:
//! - [`FeedPager`]: cursor pagination with a single in-flight fetch
//! - [`visibility`]: the per-viewer audience predicate
//! - [`InteractionStore`]: cached vote/favorite status lookups
//! - [`OptimisticMutator`]: vote, favorite and delete with rollback
//! - [`ScrollSentinel`]: triggers the next page near the end of the list

pub mod config;
pub mod error;
pub mod identity;
pub mod interactions;
pub mod mutator;
pub mod pager;
pub mod sentinel;
pub mod visibility;

use std::sync::Arc;

use campus_feed_models::ContentKind;
use campus_feed_traits::{DocumentStore, IdentityProvider};
use tracing::info;

pub use config::FeedConfig;
pub use error::{FeedError, MutationError};
pub use identity::StaticIdentity;
pub use interactions::InteractionStore;
pub use mutator::{FavoriteToggle, OptimisticMutator, Transition, VoteTransition};
pub use pager::{FeedPager, FeedSnapshot, FeedState, LoadOutcome};
pub use sentinel::{Observation, ScrollSentinel};

/// Everything one feed view needs, built for the current viewer and torn
/// down with the view.
pub struct FeedSession {
    pub pager: Arc<FeedPager>,
    pub mutator: OptimisticMutator,
    pub config: FeedConfig,
}

impl FeedSession {
    /// Resolve the viewer and wire up a pager and mutator over `store`.
    /// A viewer still authenticating is treated as signed out.
    pub async fn open(
        kind: ContentKind,
        store: Arc<dyn DocumentStore>,
        identity: &dyn IdentityProvider,
        config: FeedConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let viewer = identity.current_viewer().await;
        info!(
            collection = kind.collection(),
            viewer = viewer.as_ref().map(|viewer| viewer.id.as_str()),
            "opening feed session"
        );

        let pager = Arc::new(FeedPager::new(kind, store.clone(), viewer, &config));
        let mutator = OptimisticMutator::new(pager.clone(), store, &config);
        Ok(Self {
            pager,
            mutator,
            config,
        })
    }

    /// A scroll sentinel bound to this session's pager.
    pub fn sentinel(&self) -> ScrollSentinel {
        ScrollSentinel::new(self.pager.clone(), &self.config)
    }
}
