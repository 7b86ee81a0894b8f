//! Visibility descriptors and viewer profiles.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Three independent allow-lists gating who may see an item.
///
/// An empty list leaves that dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VisibilitySettings {
    #[serde(default)]
    pub branches: BTreeSet<String>,
    #[serde(default)]
    pub years_of_passing: BTreeSet<i32>,
    #[serde(default)]
    pub genders: BTreeSet<String>,
}

impl VisibilitySettings {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_years<I>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        self.years_of_passing = years.into_iter().collect();
        self
    }

    pub fn with_genders<I, S>(mut self, genders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genders = genders.into_iter().map(Into::into).collect();
        self
    }

    /// True when no dimension restricts the audience.
    pub fn is_unrestricted(&self) -> bool {
        self.branches.is_empty() && self.years_of_passing.is_empty() && self.genders.is_empty()
    }
}

/// Attributes of the current user used to evaluate visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ViewerProfile {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub year_of_passing: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl ViewerProfile {
    pub fn new(branch: impl Into<String>, year_of_passing: i32, gender: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
            year_of_passing: Some(year_of_passing),
            gender: Some(gender.into()),
        }
    }
}

/// A signed-in user. `profile` is `None` when the profile failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Viewer {
    pub id: String,
    #[serde(default)]
    pub profile: Option<ViewerProfile>,
}

impl Viewer {
    pub fn new(id: impl Into<String>, profile: ViewerProfile) -> Self {
        Self {
            id: id.into(),
            profile: Some(profile),
        }
    }

    pub fn without_profile(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: None,
        }
    }
}
