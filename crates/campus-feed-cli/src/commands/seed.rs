use anyhow::Result;
use campus_feed_models::{ContentItem, VisibilitySettings};
use campus_feed_storage::RedbDocumentStore;
use chrono::{Duration, Utc};
use colored::Colorize;
use serde_json::json;
use uuid::Uuid;

use crate::cli::SeedArgs;
use crate::output::{OutputFormat, json::print_json};

pub fn run(store: &RedbDocumentStore, args: SeedArgs, format: OutputFormat) -> Result<()> {
    let visibility = VisibilitySettings::default()
        .with_branches(args.branches)
        .with_years(args.years)
        .with_genders(args.genders);
    let now = Utc::now();

    let mut ids = Vec::with_capacity(args.count);
    for i in 0..args.count {
        let n = i as i64;
        let item = ContentItem::new(
            Uuid::new_v4().to_string(),
            args.kind,
            args.author.as_str(),
            format!("Sample {} #{}", args.kind.collection(), i + 1),
            now - Duration::minutes(n),
        )
        .with_counters((n * 7) % 13, (n * 3) % 5)
        .with_visibility(visibility.clone());
        store.put_item(&item)?;
        ids.push(item.id);
    }

    let total = store.count(args.kind)?;
    tracing::info!(
        collection = args.kind.collection(),
        created = ids.len(),
        total,
        "collection seeded"
    );

    if format.is_json() {
        return print_json(&json!({
            "collection": args.kind.collection(),
            "created": ids,
            "total": total,
        }));
    }

    println!(
        "{} {} items into {} ({} total)",
        "Seeded".green().bold(),
        ids.len(),
        args.kind.collection(),
        total
    );
    Ok(())
}
