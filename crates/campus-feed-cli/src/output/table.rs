use anyhow::Result;
use campus_feed_models::{FeedItem, Vote};
use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

pub fn item_table<'a>(items: impl IntoIterator<Item = &'a FeedItem>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Title", "Score", "Up", "Down", "Vote", "Fav", "Created",
    ]);

    for item in items {
        let content = &item.content;
        table.add_row(vec![
            Cell::new(&content.id),
            Cell::new(preview_text(&content.title, 40)),
            Cell::new(content.score),
            Cell::new(content.upvotes),
            Cell::new(content.downvotes),
            Cell::new(vote_label(item.interaction.vote)),
            Cell::new(if item.interaction.favorite { "*" } else { "" }),
            Cell::new(
                content
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
            ),
        ]);
    }

    table
}

fn vote_label(vote: Vote) -> String {
    match vote {
        Vote::Up => "up".green().to_string(),
        Vote::Down => "down".red().to_string(),
        Vote::None => "-".to_string(),
    }
}

pub fn preview_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}
