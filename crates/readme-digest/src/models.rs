use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One fetched record rendered as a single line of the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub url: String,
    pub date: DateTime<Utc>,
    /// Secondary text shown after the name, e.g. a release tag.
    pub label: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, url: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            date,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Latest release of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(default = "Release::default_tag")]
    pub tag_name: String,
    pub html_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    fn default_tag() -> String {
        "latest".to_string()
    }
}

/// Which repository timestamp orders a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Created,
    Updated,
}

impl SortKey {
    /// Value of the `sort` query parameter understood by the GitHub API.
    pub fn as_query(&self) -> &'static str {
        match self {
            SortKey::Created => "created",
            SortKey::Updated => "updated",
        }
    }
}

/// What to do when a top-level list request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Fatal,
    /// Log the failure and treat the list as empty.
    Empty,
}

/// The marked regions of the README this tool maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    LatestRepos,
    LatestReleases,
    LatestTils,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::LatestRepos,
        Section::LatestReleases,
        Section::LatestTils,
    ];

    pub fn marker(&self) -> &'static str {
        match self {
            Section::LatestRepos => "latest_repos",
            Section::LatestReleases => "latest_releases",
            Section::LatestTils => "latest_tils",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_without_tag_defaults_to_latest() {
        let release: Release = serde_json::from_str(
            r#"{"html_url":"https://github.com/octo/tool/releases/1","published_at":null}"#,
        )
        .unwrap();
        assert_eq!(release.tag_name, "latest");
        assert_eq!(release.published_at, None);
    }
}
