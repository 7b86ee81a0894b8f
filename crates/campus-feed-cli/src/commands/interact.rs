use std::sync::Arc;

use anyhow::{Result, bail};
use campus_feed_core::{FeedConfig, FeedSession, MutationError};
use campus_feed_models::{ContentKind, FeedItem};
use campus_feed_storage::RedbDocumentStore;
use campus_feed_traits::IdentityProvider;
use colored::Colorize;
use serde_json::json;

use crate::cli::{ItemArgs, VoteArgs};
use crate::commands::load_until;
use crate::output::table::{item_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn vote(
    store: Arc<RedbDocumentStore>,
    config: FeedConfig,
    args: VoteArgs,
    format: OutputFormat,
) -> Result<()> {
    let identity = args.viewer.identity();
    let session = open_at(store, config, args.kind, &identity, &args.item_id).await?;
    let item = session
        .mutator
        .apply_vote(&args.item_id, args.direction.into())
        .await
        .map_err(into_report)?;
    print_item(&item, format)
}

pub async fn favorite(
    store: Arc<RedbDocumentStore>,
    config: FeedConfig,
    args: ItemArgs,
    format: OutputFormat,
) -> Result<()> {
    let identity = args.viewer.identity();
    let session = open_at(store, config, args.kind, &identity, &args.item_id).await?;
    let item = session
        .mutator
        .toggle_favorite(&args.item_id)
        .await
        .map_err(into_report)?;
    print_item(&item, format)
}

pub async fn delete(
    store: Arc<RedbDocumentStore>,
    config: FeedConfig,
    args: ItemArgs,
    format: OutputFormat,
) -> Result<()> {
    let identity = args.viewer.identity();
    let session = open_at(store, config, args.kind, &identity, &args.item_id).await?;
    session
        .mutator
        .delete_item(&args.item_id)
        .await
        .map_err(into_report)?;

    if format.is_json() {
        return print_json(&json!({ "deleted": args.item_id }));
    }
    println!("{} {}", "Deleted".green().bold(), args.item_id);
    Ok(())
}

/// Open a session and page forward until `item_id` is loaded. Signed-out
/// viewers skip the search; the mutator rejects them before any lookup.
async fn open_at(
    store: Arc<RedbDocumentStore>,
    config: FeedConfig,
    kind: ContentKind,
    identity: &dyn IdentityProvider,
    item_id: &str,
) -> Result<FeedSession> {
    let session = FeedSession::open(kind, store, identity, config).await?;
    if session.pager.viewer().is_some() && !load_until(&session.pager, item_id).await? {
        bail!("Item {item_id} is not visible in {}", kind.collection());
    }
    Ok(session)
}

fn into_report(err: MutationError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn print_item(item: &FeedItem, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        return print_json(item);
    }
    print_table(item_table([item]))
}
