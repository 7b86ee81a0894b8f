//! Error types for the feed engine

use std::time::Duration;

use campus_feed_traits::StoreError;
use thiserror::Error;

/// Page fetch failure. The feed moves to `Errored` and can be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] StoreError),

    #[error("Fetch timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl FeedError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FeedError::Fetch(err) if err.is_permission_denied())
    }

    /// Permission failures are not retried automatically.
    pub fn is_retryable(&self) -> bool {
        !self.is_permission_denied()
    }

    /// Message suitable for the feed's error banner.
    pub fn user_message(&self) -> &'static str {
        if self.is_permission_denied() {
            "You don't have access to this feed."
        } else {
            "Couldn't load posts. Tap to retry."
        }
    }
}

/// Vote, favorite or delete failure. Local state has already been rolled
/// back when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Another action on item {0} is still in flight")]
    InFlight(String),

    #[error("Item {0} is not in this feed")]
    UnknownItem(String),

    #[error("Sign in to interact with posts")]
    SignedOut,

    #[error("Mutation failed: {0}")]
    Remote(#[from] StoreError),

    #[error("Mutation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl MutationError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, MutationError::Remote(err) if err.is_permission_denied())
    }

    /// True when the action was refused before touching local state.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            MutationError::InFlight(_) | MutationError::UnknownItem(_) | MutationError::SignedOut
        )
    }

    /// Message suitable for a transient notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            MutationError::SignedOut => "Sign in to vote or save posts.",
            _ if self.is_permission_denied() => "You're not allowed to do that.",
            MutationError::InFlight(_) => "Hang on, still saving your last action.",
            _ => "Couldn't save your change. Please try again.",
        }
    }
}
