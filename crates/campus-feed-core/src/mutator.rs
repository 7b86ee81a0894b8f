//! Optimistic vote, favorite and delete actions.
//!
//! Every action follows the same shape: snapshot the item, apply the
//! expected result locally, issue one idempotent remote write, and on
//! failure restore the snapshot exactly. Only one action per item may be in
//! flight; further actions on that item are rejected until it resolves.
//! Actions on different items run independently.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use campus_feed_models::{CounterDelta, FeedItem, Mutation, MutationOutcome, VoteAction};
use campus_feed_traits::DocumentStore;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::MutationError;
use crate::pager::FeedPager;

/// A speculative local change and the remote write that commits it.
pub trait Transition: Send + Sync {
    fn label(&self) -> &'static str;

    /// Apply the change to `item` and return the write that makes it durable.
    fn apply(&self, item: &mut FeedItem, viewer_id: &str) -> Mutation;
}

/// Press the up or down vote button.
#[derive(Debug, Clone, Copy)]
pub struct VoteTransition(pub VoteAction);

impl Transition for VoteTransition {
    fn label(&self) -> &'static str {
        match self.0 {
            VoteAction::Up => "vote_up",
            VoteAction::Down => "vote_down",
        }
    }

    fn apply(&self, item: &mut FeedItem, viewer_id: &str) -> Mutation {
        let current = item.interaction.vote;
        let next = current.after(self.0);
        item.content.apply_delta(CounterDelta::between(current, next));
        item.interaction.vote = next;
        Mutation::SetVote {
            kind: item.content.kind,
            item_id: item.content.id.clone(),
            viewer_id: viewer_id.to_string(),
            vote: next,
        }
    }
}

/// Flip the favorite flag.
#[derive(Debug, Clone, Copy)]
pub struct FavoriteToggle;

impl Transition for FavoriteToggle {
    fn label(&self) -> &'static str {
        "favorite"
    }

    fn apply(&self, item: &mut FeedItem, viewer_id: &str) -> Mutation {
        item.interaction.favorite = !item.interaction.favorite;
        Mutation::SetFavorite {
            kind: item.content.kind,
            item_id: item.content.id.clone(),
            viewer_id: viewer_id.to_string(),
            favorite: item.interaction.favorite,
        }
    }
}

/// Releases an item's in-flight slot when dropped.
struct InFlight<'a> {
    slots: &'a Mutex<HashSet<String>>,
    item_id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.item_id);
    }
}

pub struct OptimisticMutator {
    pager: Arc<FeedPager>,
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
    in_flight: Mutex<HashSet<String>>,
}

impl OptimisticMutator {
    pub fn new(pager: Arc<FeedPager>, store: Arc<dyn DocumentStore>, config: &FeedConfig) -> Self {
        Self {
            pager,
            store,
            timeout: config.mutation_timeout(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_in_flight(&self, item_id: &str) -> bool {
        self.in_flight.lock().contains(item_id)
    }

    pub async fn apply_vote(
        &self,
        item_id: &str,
        action: VoteAction,
    ) -> Result<FeedItem, MutationError> {
        self.apply(item_id, &VoteTransition(action)).await
    }

    pub async fn toggle_favorite(&self, item_id: &str) -> Result<FeedItem, MutationError> {
        self.apply(item_id, &FavoriteToggle).await
    }

    /// Run `transition` optimistically against a loaded item. Returns the
    /// item as now shown; on error the item is back to its prior value.
    pub async fn apply<T: Transition>(
        &self,
        item_id: &str,
        transition: &T,
    ) -> Result<FeedItem, MutationError> {
        let viewer_id = self.viewer_id()?;
        let _slot = self.claim(item_id)?;

        let snapshot = self
            .pager
            .item(item_id)
            .ok_or_else(|| MutationError::UnknownItem(item_id.to_string()))?;
        let epoch = self.pager.epoch();

        let mut optimistic = snapshot.clone();
        let mutation = transition.apply(&mut optimistic, &viewer_id);
        self.pager.replace_item(optimistic.clone());
        debug!(item_id, action = transition.label(), "optimistic update applied");

        match self.commit(mutation).await {
            Ok(outcome) => {
                if let Some(state) = outcome.interaction {
                    self.pager.interactions().remember(item_id, state);
                }
                Ok(optimistic)
            }
            Err(err) => {
                if self.pager.epoch() == epoch {
                    self.pager.replace_item(snapshot);
                }
                warn!(
                    item_id,
                    action = transition.label(),
                    error = %err,
                    "rolled back optimistic update"
                );
                Err(err)
            }
        }
    }

    /// Delete an item the viewer authored. It disappears from the feed
    /// immediately and is put back in place if the store refuses.
    pub async fn delete_item(&self, item_id: &str) -> Result<(), MutationError> {
        let viewer_id = self.viewer_id()?;
        let _slot = self.claim(item_id)?;

        let epoch = self.pager.epoch();
        let (index, removed) = self
            .pager
            .remove_item(item_id)
            .ok_or_else(|| MutationError::UnknownItem(item_id.to_string()))?;
        let mutation = Mutation::DeleteItem {
            kind: removed.content.kind,
            item_id: item_id.to_string(),
            requester_id: viewer_id,
        };

        match self.commit(mutation).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if self.pager.epoch() == epoch {
                    self.pager.insert_item(index, removed);
                }
                warn!(item_id, error = %err, "rolled back optimistic delete");
                Err(err)
            }
        }
    }

    fn viewer_id(&self) -> Result<String, MutationError> {
        self.pager
            .viewer()
            .map(|viewer| viewer.id.clone())
            .ok_or(MutationError::SignedOut)
    }

    fn claim(&self, item_id: &str) -> Result<InFlight<'_>, MutationError> {
        if !self.in_flight.lock().insert(item_id.to_string()) {
            debug!(item_id, "action rejected while another is in flight");
            return Err(MutationError::InFlight(item_id.to_string()));
        }
        Ok(InFlight {
            slots: &self.in_flight,
            item_id: item_id.to_string(),
        })
    }

    async fn commit(&self, mutation: Mutation) -> Result<MutationOutcome, MutationError> {
        match tokio::time::timeout(self.timeout, self.store.mutate(mutation)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(MutationError::Timeout(self.timeout)),
        }
    }
}
