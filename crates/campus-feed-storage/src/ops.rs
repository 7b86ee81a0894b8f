//! Store-agnostic query and mutation rules shared by both stores.

use campus_feed_models::{
    ContentItem, CounterDelta, InteractionState, PageQuery, Vote,
};
use campus_feed_traits::StoreError;

/// Record key for one viewer's interaction with one item. The viewer id is
/// length-prefixed so ids containing `:` cannot collide.
pub(crate) fn interaction_key(viewer_id: &str, item_id: &str) -> String {
    format!("{}:{viewer_id}:{item_id}", viewer_id.len())
}

/// Select one page of `items` for `query`.
pub(crate) fn select_page<I>(items: I, query: &PageQuery) -> Result<Vec<ContentItem>, StoreError>
where
    I: IntoIterator<Item = ContentItem>,
{
    if let Some(cursor) = &query.after
        && cursor.sort() != query.sort
    {
        return Err(StoreError::InvalidQuery(format!(
            "cursor minted under '{}' cannot resume a '{}' query",
            cursor.sort(),
            query.sort
        )));
    }

    let mut page: Vec<ContentItem> = items
        .into_iter()
        .filter(|item| query.after.as_ref().is_none_or(|cursor| cursor.admits(item)))
        .collect();
    query.sort.sort(&mut page);
    page.truncate(query.limit);
    Ok(page)
}

/// Move the viewer's vote on `item` to `vote`, adjusting counters by the
/// difference from their previous vote.
pub(crate) fn set_vote(
    item: &mut ContentItem,
    previous: InteractionState,
    vote: Vote,
) -> InteractionState {
    item.apply_delta(CounterDelta::between(previous.vote, vote));
    InteractionState { vote, ..previous }
}

pub(crate) fn set_favorite(previous: InteractionState, favorite: bool) -> InteractionState {
    InteractionState {
        favorite,
        ..previous
    }
}

pub(crate) fn check_author(item: &ContentItem, requester_id: &str) -> Result<(), StoreError> {
    if item.author_id == requester_id {
        Ok(())
    } else {
        Err(StoreError::PermissionDenied(format!(
            "only the author may delete {}",
            item.id
        )))
    }
}

pub(crate) fn missing(item_id: &str) -> StoreError {
    StoreError::NotFound(format!("content item {item_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_feed_models::{ContentKind, Cursor, SortKey};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, created_secs: i64) -> ContentItem {
        ContentItem::new(
            id,
            ContentKind::Post,
            "author",
            id,
            Utc.timestamp_opt(created_secs, 0).unwrap(),
        )
    }

    #[test]
    fn test_interaction_keys_are_unambiguous() {
        assert_ne!(interaction_key("a:b", "c"), interaction_key("a", "b:c"));
        assert_ne!(interaction_key("1:a", "b"), interaction_key("1", "a:b"));
        assert_eq!(interaction_key("v1", "p1"), "2:v1:p1");
    }

    #[test]
    fn test_select_page_resumes_after_cursor() {
        let items: Vec<_> = (1..=5).map(|i| item(&format!("p{i}"), i)).collect();
        let cursor = Cursor::at(SortKey::Newest, &items[3]);
        let query = PageQuery::first(ContentKind::Post, SortKey::Newest, 2).after(Some(cursor));

        let page = select_page(items, &query).unwrap();
        let ids: Vec<_> = page.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["p3", "p2"]);
    }

    #[test]
    fn test_select_page_rejects_foreign_cursor() {
        let items = vec![item("p1", 1)];
        let cursor = Cursor::at(SortKey::TopScore, &items[0]);
        let query = PageQuery::first(ContentKind::Post, SortKey::Newest, 2).after(Some(cursor));
        assert!(matches!(
            select_page(items, &query),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_repeated_vote_is_idempotent() {
        let mut post = item("p1", 1);
        let state = set_vote(&mut post, InteractionState::default(), Vote::Up);
        let state = set_vote(&mut post, state, Vote::Up);
        assert_eq!(state.vote, Vote::Up);
        assert_eq!(post.upvotes, 1);
        assert_eq!(post.score, 1);
    }

    #[test]
    fn test_vote_preserves_favorite() {
        let mut post = item("p1", 1);
        let previous = InteractionState {
            vote: Vote::None,
            favorite: true,
        };
        let state = set_vote(&mut post, previous, Vote::Down);
        assert!(state.favorite);
        assert_eq!(post.downvotes, 1);
    }

    #[test]
    fn test_only_author_may_delete() {
        let post = item("p1", 1);
        assert!(check_author(&post, "author").is_ok());
        assert!(check_author(&post, "someone").unwrap_err().is_permission_denied());
    }
}
