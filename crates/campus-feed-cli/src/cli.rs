use std::path::PathBuf;

use campus_feed_core::StaticIdentity;
use campus_feed_models::{ContentKind, SortKey, Viewer, ViewerProfile, VoteAction};
use clap::{Args, Parser, Subcommand, ValueEnum};

pub use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "campus-feed")]
#[command(version, about = "Campus Feed - browse and interact with the campus community feed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path
    #[arg(
        long,
        global = true,
        env = "CAMPUS_FEED_DB_PATH",
        default_value = "campus-feed.redb"
    )]
    pub db_path: PathBuf,

    /// Feed configuration file (TOML)
    #[arg(long, global = true, env = "CAMPUS_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Populate a collection with sample items
    Seed(SeedArgs),

    /// Page through a feed
    Browse(BrowseArgs),

    /// Up- or down-vote an item
    Vote(VoteArgs),

    /// Toggle an item in the viewer's favorites
    Favorite(ItemArgs),

    /// Delete an item the viewer authored
    Delete(ItemArgs),
}

#[derive(Args)]
pub struct SeedArgs {
    /// Collection to seed (posts, events, lost_and_found)
    #[arg(long, default_value = "posts", value_parser = parse_kind)]
    pub kind: ContentKind,

    /// Number of items to create
    #[arg(long, default_value_t = 25)]
    pub count: usize,

    /// Author id recorded on every item
    #[arg(long, default_value = "seed-author")]
    pub author: String,

    /// Restrict items to these branches (repeatable)
    #[arg(long = "branch")]
    pub branches: Vec<String>,

    /// Restrict items to these years of passing (repeatable)
    #[arg(long = "year")]
    pub years: Vec<i32>,

    /// Restrict items to these genders (repeatable)
    #[arg(long = "gender")]
    pub genders: Vec<String>,
}

#[derive(Args)]
pub struct BrowseArgs {
    /// Collection to browse (posts, events, lost_and_found)
    #[arg(long, default_value = "posts", value_parser = parse_kind)]
    pub kind: ContentKind,

    /// Sort order (newest, top_score, most_upvoted)
    #[arg(long, default_value = "newest")]
    pub sort: SortKey,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    #[command(flatten)]
    pub viewer: ViewerArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VoteDirection {
    Up,
    Down,
}

impl From<VoteDirection> for VoteAction {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => VoteAction::Up,
            VoteDirection::Down => VoteAction::Down,
        }
    }
}

#[derive(Args)]
pub struct VoteArgs {
    /// Item to vote on
    pub item_id: String,

    /// Vote direction; repeating the current vote clears it
    #[arg(value_enum)]
    pub direction: VoteDirection,

    /// Collection the item belongs to
    #[arg(long, default_value = "posts", value_parser = parse_kind)]
    pub kind: ContentKind,

    #[command(flatten)]
    pub viewer: ViewerArgs,
}

#[derive(Args)]
pub struct ItemArgs {
    /// Item id
    pub item_id: String,

    /// Collection the item belongs to
    #[arg(long, default_value = "posts", value_parser = parse_kind)]
    pub kind: ContentKind,

    #[command(flatten)]
    pub viewer: ViewerArgs,
}

#[derive(Args)]
pub struct ViewerArgs {
    /// Viewer id; omit to act signed out
    #[arg(long, env = "CAMPUS_FEED_VIEWER")]
    pub viewer: Option<String>,

    /// Viewer's branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Viewer's year of passing
    #[arg(long)]
    pub year: Option<i32>,

    /// Viewer's gender
    #[arg(long)]
    pub gender: Option<String>,
}

impl ViewerArgs {
    /// Identity for the session. Profile attributes are ignored when no
    /// viewer id is given.
    pub fn identity(&self) -> StaticIdentity {
        let Some(id) = self.viewer.clone() else {
            return StaticIdentity::signed_out();
        };
        if self.branch.is_none() && self.year.is_none() && self.gender.is_none() {
            return StaticIdentity::signed_in(Viewer::without_profile(id));
        }
        let profile = ViewerProfile {
            branch: self.branch.clone(),
            year_of_passing: self.year,
            gender: self.gender.clone(),
        };
        StaticIdentity::signed_in(Viewer::new(id, profile))
    }
}

fn parse_kind(value: &str) -> Result<ContentKind, String> {
    ContentKind::from_collection(value).ok_or_else(|| {
        format!("unknown collection: {value} (expected posts, events or lost_and_found)")
    })
}
