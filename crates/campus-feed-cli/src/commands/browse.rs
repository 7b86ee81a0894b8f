use std::sync::Arc;

use anyhow::Result;
use campus_feed_core::{FeedConfig, FeedSession, FeedState};
use campus_feed_storage::RedbDocumentStore;
use colored::Colorize;

use crate::cli::BrowseArgs;
use crate::output::table::{item_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn run(
    store: Arc<RedbDocumentStore>,
    config: FeedConfig,
    args: BrowseArgs,
    format: OutputFormat,
) -> Result<()> {
    let identity = args.viewer.identity();
    let session = FeedSession::open(args.kind, store, &identity, config).await?;
    let pager = &session.pager;

    if args.sort == pager.sort() {
        pager.load_initial().await?;
    } else {
        pager.set_sort(args.sort).await?;
    }
    for _ in 1..args.pages {
        if pager.state() != FeedState::Idle {
            break;
        }
        pager.load_more().await?;
    }

    let snapshot = pager.snapshot();
    if format.is_json() {
        return print_json(&snapshot);
    }

    if snapshot.items.is_empty() {
        println!("{}", "No items to show.".dimmed());
    } else {
        print_table(item_table(&snapshot.items))?;
    }
    if snapshot.has_more {
        println!("{}", "More items available; pass --pages to load further.".dimmed());
    } else {
        println!("{}", "End of feed.".dimmed());
    }
    Ok(())
}
