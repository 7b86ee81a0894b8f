//! Infinite-scroll trigger.
//!
//! The sentinel watches the last rendered item. When that item comes within
//! `scroll_threshold_px` of the viewport edge it asks the pager for the next
//! page, once per crossing. Pager state is checked when the crossing is
//! signalled, so a slow response and a fast scroll cannot race into a
//! second fetch.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::pager::{FeedPager, FeedState, LoadOutcome};

/// Position report for the observed item.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub target_id: String,
    /// Distance from the viewport's trailing edge to the item; zero or
    /// negative once the item is on screen.
    pub distance_px: f64,
}

impl Observation {
    pub fn new(target_id: impl Into<String>, distance_px: f64) -> Self {
        Self {
            target_id: target_id.into(),
            distance_px,
        }
    }

    /// Build from layout geometry: the item's leading edge and the
    /// viewport's trailing edge, in the same coordinate space.
    pub fn from_geometry(
        target_id: impl Into<String>,
        item_top_px: f64,
        viewport_bottom_px: f64,
    ) -> Self {
        Self::new(target_id, item_top_px - viewport_bottom_px)
    }
}

pub struct ScrollSentinel {
    pager: Arc<FeedPager>,
    threshold_px: f64,
    target: Option<String>,
    near: bool,
}

impl ScrollSentinel {
    pub fn new(pager: Arc<FeedPager>, config: &FeedConfig) -> Self {
        let target = pager.last_item_id();
        Self {
            pager,
            threshold_px: config.scroll_threshold_px,
            target,
            near: false,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Point the sentinel at `last_item_id`. Switching targets disconnects
    /// the old one and re-arms the trigger. Returns true if the target
    /// changed.
    pub fn observe(&mut self, last_item_id: Option<String>) -> bool {
        if self.target == last_item_id {
            return false;
        }
        debug!(from = ?self.target, to = ?last_item_id, "sentinel reconnected");
        self.target = last_item_id;
        self.near = false;
        true
    }

    /// Decide whether `observation` should trigger a page load.
    pub fn signal(&mut self, observation: &Observation) -> bool {
        if self.target.as_deref() != Some(observation.target_id.as_str()) {
            return false;
        }

        let near = observation.distance_px <= self.threshold_px;
        if !near {
            self.near = false;
            return false;
        }
        if self.near {
            return false;
        }

        match self.pager.state() {
            FeedState::Idle => {
                self.near = true;
                true
            }
            state @ (FeedState::LoadingInitial
            | FeedState::LoadingMore
            | FeedState::Exhausted
            | FeedState::Errored) => {
                // Stay armed; the next report re-checks the pager.
                debug!(?state, target = %observation.target_id, "sentinel crossing suppressed");
                false
            }
        }
    }

    /// Handle one observation, loading the next page if it fires. Returns
    /// `None` when nothing was requested.
    pub async fn on_observation(
        &mut self,
        observation: &Observation,
    ) -> Result<Option<LoadOutcome>, FeedError> {
        self.observe(self.pager.last_item_id());
        if !self.signal(observation) {
            return Ok(None);
        }

        let result = self.pager.load_more().await;
        // Reconnect even when the page added nothing visible, so a viewer
        // parked at the bottom keeps pulling pages.
        if !self.observe(self.pager.last_item_id()) {
            self.near = false;
        }
        result.map(Some)
    }

    /// Consume observations until the channel closes. Returns the number of
    /// pages loaded.
    pub async fn run(mut self, mut observations: mpsc::Receiver<Observation>) -> usize {
        let mut loaded = 0;
        while let Some(observation) = observations.recv().await {
            match self.on_observation(&observation).await {
                Ok(Some(LoadOutcome::Loaded { .. })) => loaded += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "sentinel-triggered load failed");
                }
            }
        }
        loaded
    }
}
