//! Sort keys, page cursors and page queries.
//!
//! Every sort key defines a total order over items: the primary value
//! descending, then `created_at` descending, then `id` descending. Cursors
//! record an item's position in that order so a later query can resume
//! strictly after it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::content::{ContentItem, ContentKind};

/// Order applied by the remote store to a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SortKey {
    #[default]
    Newest,
    TopScore,
    MostUpvoted,
}

impl SortKey {
    fn primary(&self, item: &ContentItem) -> i64 {
        match self {
            SortKey::Newest => item.created_at.timestamp_millis(),
            SortKey::TopScore => item.score,
            SortKey::MostUpvoted => item.upvotes,
        }
    }

    /// Feed order: `Less` means `a` is shown before `b`.
    pub fn compare(&self, a: &ContentItem, b: &ContentItem) -> Ordering {
        Position::of(*self, a).cmp(&Position::of(*self, b))
    }

    /// Sort `items` into feed order.
    pub fn sort(&self, items: &mut [ContentItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortKey::Newest => "newest",
            SortKey::TopScore => "top_score",
            SortKey::MostUpvoted => "most_upvoted",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortKey::Newest),
            "top_score" | "top" => Ok(SortKey::TopScore),
            "most_upvoted" | "upvoted" => Ok(SortKey::MostUpvoted),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    primary: i64,
    created_at_ms: i64,
    id: String,
}

impl Position {
    fn of(sort: SortKey, item: &ContentItem) -> Self {
        Self {
            primary: sort.primary(item),
            created_at_ms: item.created_at.timestamp_millis(),
            id: item.id.clone(),
        }
    }
}

impl Ord for Position {
    // Descending on every component.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .primary
            .cmp(&self.primary)
            .then_with(|| other.created_at_ms.cmp(&self.created_at_ms))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Opaque resume point: the last item returned by a previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    sort: SortKey,
    position: Position,
}

impl Cursor {
    /// Cursor positioned at `item` under `sort`.
    pub fn at(sort: SortKey, item: &ContentItem) -> Self {
        Self {
            sort,
            position: Position::of(sort, item),
        }
    }

    /// Sort key this cursor was minted under.
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Id of the item the cursor points at.
    pub fn item_id(&self) -> &str {
        &self.position.id
    }

    /// True when `item` sorts strictly after the cursor.
    pub fn admits(&self, item: &ContentItem) -> bool {
        Position::of(self.sort, item) > self.position
    }

    /// True when both cursors share a sort key and `self` sorts strictly
    /// before `other`.
    pub fn precedes(&self, other: &Cursor) -> bool {
        self.sort == other.sort && self.position < other.position
    }
}

/// One page request against a content collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub kind: ContentKind,
    pub sort: SortKey,
    pub after: Option<Cursor>,
    pub limit: usize,
}

impl PageQuery {
    pub fn first(kind: ContentKind, sort: SortKey, limit: usize) -> Self {
        Self {
            kind,
            sort,
            after: None,
            limit,
        }
    }

    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.after = cursor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, created_secs: i64, upvotes: i64, downvotes: i64) -> ContentItem {
        ContentItem::new(
            id,
            ContentKind::Post,
            "author",
            id,
            Utc.timestamp_opt(created_secs, 0).unwrap(),
        )
        .with_counters(upvotes, downvotes)
    }

    #[test]
    fn test_newest_orders_by_creation_descending() {
        let mut items = vec![item("a", 10, 0, 0), item("b", 30, 0, 0), item("c", 20, 0, 0)];
        SortKey::Newest.sort(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_score_ties_break_on_creation_then_id() {
        let mut items = vec![
            item("a", 10, 5, 0),
            item("b", 20, 5, 0),
            item("c", 20, 5, 0),
            item("d", 5, 9, 1),
        ];
        SortKey::TopScore.sort(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["d", "c", "b", "a"]);
    }

    #[test]
    fn test_cursor_admits_only_later_items() {
        let items = [item("a", 30, 0, 0), item("b", 20, 0, 0), item("c", 10, 0, 0)];
        let cursor = Cursor::at(SortKey::Newest, &items[1]);
        assert!(!cursor.admits(&items[0]));
        assert!(!cursor.admits(&items[1]));
        assert!(cursor.admits(&items[2]));
    }

    #[test]
    fn test_precedes_requires_same_sort() {
        let first = item("a", 30, 1, 0);
        let second = item("b", 20, 0, 0);
        let newest_a = Cursor::at(SortKey::Newest, &first);
        let newest_b = Cursor::at(SortKey::Newest, &second);
        assert!(newest_a.precedes(&newest_b));
        assert!(!newest_b.precedes(&newest_a));
        assert!(!Cursor::at(SortKey::TopScore, &first).precedes(&newest_b));
    }

    #[test]
    fn test_sort_key_parses_display_form() {
        for key in [SortKey::Newest, SortKey::TopScore, SortKey::MostUpvoted] {
            assert_eq!(key.to_string().parse::<SortKey>(), Ok(key));
        }
        assert!("hot".parse::<SortKey>().is_err());
    }
}
