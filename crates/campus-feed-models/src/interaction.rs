//! Per-viewer interaction state and the vote transition table.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The viewer's current vote on an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Vote {
    Up,
    Down,
    #[default]
    None,
}

/// A vote button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum VoteAction {
    Up,
    Down,
}

impl Vote {
    /// Vote that results from pressing `action` while holding `self`.
    ///
    /// Pressing the button matching the current vote clears it; pressing the
    /// other one switches sides.
    pub fn after(self, action: VoteAction) -> Vote {
        match (self, action) {
            (Vote::Up, VoteAction::Up) | (Vote::Down, VoteAction::Down) => Vote::None,
            (_, VoteAction::Up) => Vote::Up,
            (_, VoteAction::Down) => Vote::Down,
        }
    }

    fn upvote_weight(self) -> i64 {
        i64::from(self == Vote::Up)
    }

    fn downvote_weight(self) -> i64 {
        i64::from(self == Vote::Down)
    }
}

/// Change to an item's aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl CounterDelta {
    /// Counter change caused by one viewer moving from `from` to `to`.
    pub fn between(from: Vote, to: Vote) -> Self {
        Self {
            upvotes: to.upvote_weight() - from.upvote_weight(),
            downvotes: to.downvote_weight() - from.downvote_weight(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }
}

/// A viewer's vote and favorite on one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InteractionState {
    #[serde(default)]
    pub vote: Vote,
    #[serde(default)]
    pub favorite: bool,
}

impl InteractionState {
    pub fn is_empty(&self) -> bool {
        self.vote == Vote::None && !self.favorite
    }
}
