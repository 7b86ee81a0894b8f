pub mod browse;
pub mod interact;
pub mod seed;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use campus_feed_core::{FeedConfig, FeedPager, FeedState};
use campus_feed_storage::RedbDocumentStore;
use tracing::debug;

pub fn load_config(path: Option<&Path>) -> Result<FeedConfig> {
    match path {
        Some(path) => FeedConfig::load(path),
        None => Ok(FeedConfig::default()),
    }
}

pub fn open_store(path: &Path) -> Result<Arc<RedbDocumentStore>> {
    debug!(path = %path.display(), "opening feed database");
    Ok(Arc::new(RedbDocumentStore::open(path)?))
}

/// Page forward until `item_id` is loaded or the feed runs out.
pub async fn load_until(pager: &FeedPager, item_id: &str) -> Result<bool> {
    loop {
        if pager.item(item_id).is_some() {
            return Ok(true);
        }
        if pager.state() == FeedState::Exhausted {
            return Ok(false);
        }
        pager.load_more().await?;
    }
}
