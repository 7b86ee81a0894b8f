//! Per-viewer visibility predicate.
//!
//! A dimension is satisfied when its allow-list is empty or contains the
//! viewer's attribute; an item is visible when all three are satisfied.
//! Missing viewer attributes never match a non-empty list, and a viewer
//! without a profile only sees fully unrestricted items.

use campus_feed_models::{ContentItem, Viewer, ViewerProfile, VisibilitySettings};

/// Who is looking at the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience<'a> {
    /// Signed out, or signed in without a loaded profile.
    Anonymous,
    Member(&'a ViewerProfile),
}

impl<'a> Audience<'a> {
    pub fn of(viewer: Option<&'a Viewer>) -> Self {
        match viewer.and_then(|viewer| viewer.profile.as_ref()) {
            Some(profile) => Audience::Member(profile),
            None => Audience::Anonymous,
        }
    }
}

/// A visibility dimension that rejected the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Branch,
    YearOfPassing,
    Gender,
}

/// First dimension that hides `settings` from `audience`, or `None` when
/// the item is visible.
pub fn denied_by(settings: &VisibilitySettings, audience: Audience<'_>) -> Option<Dimension> {
    let (branch, year, gender) = match audience {
        Audience::Member(profile) => (
            profile.branch.as_deref(),
            profile.year_of_passing,
            profile.gender.as_deref(),
        ),
        Audience::Anonymous => (None, None, None),
    };

    if !allows(&settings.branches, branch) {
        return Some(Dimension::Branch);
    }
    if !allows(&settings.years_of_passing, year.as_ref()) {
        return Some(Dimension::YearOfPassing);
    }
    if !allows(&settings.genders, gender) {
        return Some(Dimension::Gender);
    }
    None
}

fn allows<T, Q>(list: &std::collections::BTreeSet<T>, value: Option<&Q>) -> bool
where
    T: Ord + std::borrow::Borrow<Q>,
    Q: Ord + ?Sized,
{
    list.is_empty() || value.is_some_and(|value| list.contains(value))
}

pub fn is_visible(settings: &VisibilitySettings, audience: Audience<'_>) -> bool {
    denied_by(settings, audience).is_none()
}

/// Keep the items `audience` may see, preserving order.
pub fn retain_visible(items: &mut Vec<ContentItem>, audience: Audience<'_>) {
    items.retain(|item| is_visible(&item.visibility, audience));
}
