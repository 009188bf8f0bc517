use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::client::ApiClient;
use crate::fetch::{fetch_list, fetch_records, fetch_related, select_latest, ListOptions, ListRecord};
use crate::models::{Item, Release, SortKey};

/// Repository as returned by `/users/{user}/repos` and repository search.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListRecord for Repository {
    fn is_listed(&self, skip: &[String]) -> bool {
        !self.private && !skip.iter().any(|name| name.eq_ignore_ascii_case(&self.name))
    }

    fn into_item(self, sort_key: SortKey) -> Option<Item> {
        let date = match sort_key {
            SortKey::Created => self.created_at,
            SortKey::Updated => self.updated_at,
        }?;
        Some(Item::new(self.name, self.html_url, date))
    }
}

/// Entry of `/repos/{owner}/{repo}/contents`.
#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    html_url: Option<String>,
}

impl ContentEntry {
    fn is_note(&self) -> bool {
        self.kind == "file"
            && self.name.to_ascii_lowercase().ends_with(".md")
            && !self.name.eq_ignore_ascii_case("README.md")
    }

    /// `sqlite-json_tricks.md` becomes `sqlite json tricks`.
    fn title(&self) -> String {
        let stem = self
            .name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name);
        stem.replace(['-', '_'], " ")
    }
}

#[derive(Debug, Deserialize)]
struct CommitRecord {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Signature,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

pub struct GitHubClient {
    client: ApiClient,
    api_url: String,
    username: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, username: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(token)?,
            api_url: api_url.into(),
            username: username.into(),
        })
    }

    /// The user's most recently created repositories.
    pub async fn latest_repos(&self, options: &ListOptions) -> Result<Vec<Item>> {
        let url = format!(
            "{}/users/{}/repos?sort={}&direction=desc&per_page={}",
            self.api_url,
            urlencoding::encode(&self.username),
            SortKey::Created.as_query(),
            options.limit
        );

        let repos = fetch_list::<Repository>(&self.client, &url, SortKey::Created, options)
            .await
            .context("Failed to fetch latest repositories")?;

        info!(count = repos.len(), "fetched latest repositories");
        Ok(repos)
    }

    /// The latest release of each recently updated public repository that has one.
    pub async fn latest_releases(&self, options: &ListOptions) -> Result<Vec<Item>> {
        let query = format!("user:{} is:public has:releases", self.username);
        let url = format!(
            "{}/search/repositories?q={}&sort={}&order=desc&per_page={}",
            self.api_url,
            urlencoding::encode(&query),
            SortKey::Updated.as_query(),
            options.limit
        );

        let repos = fetch_list::<Repository>(&self.client, &url, SortKey::Updated, options)
            .await
            .context("Failed to search repositories with releases")?;

        let client = &self.client;
        let with_releases = fetch_related(repos, |repo| {
            let url = format!(
                "{}/repos/{}/{}/releases/latest",
                self.api_url,
                urlencoding::encode(&self.username),
                urlencoding::encode(&repo.name)
            );
            async move { client.get_optional_json::<Release>(&url).await }
        })
        .await
        .context("Failed to fetch latest releases")?;

        let releases: Vec<Item> = with_releases
            .into_iter()
            .map(|(repo, release)| {
                Item {
                    url: release.html_url.unwrap_or(repo.url),
                    date: release.published_at.unwrap_or(repo.date),
                    name: repo.name,
                    label: None,
                }
                .with_label(release.tag_name)
            })
            .collect();

        info!(count = releases.len(), "fetched latest releases");
        Ok(select_latest(releases, options.limit))
    }

    /// Markdown notes kept at the root of `repo` (`owner/name`), dated by
    /// their most recent commit.
    pub async fn repo_notes(&self, repo: &str, options: &ListOptions) -> Result<Vec<Item>> {
        let url = format!("{}/repos/{}/contents", self.api_url, repo);
        let entries: Vec<ContentEntry> = fetch_records(&self.client, &url, options.policy)
            .await
            .with_context(|| format!("Failed to list notes in {}", repo))?;

        let notes: Vec<ContentEntry> = entries.into_iter().filter(ContentEntry::is_note).collect();

        let client = &self.client;
        let dated = fetch_related(notes, |note| {
            let url = format!(
                "{}/repos/{}/commits?path={}&per_page=1",
                self.api_url,
                repo,
                urlencoding::encode(&note.path)
            );
            async move {
                let commits = client.get_optional_json::<Vec<CommitRecord>>(&url).await?;
                Ok::<_, anyhow::Error>(commits
                    .and_then(|commits| commits.into_iter().next())
                    .map(|record| record.commit.committer.date))
            }
        })
        .await
        .with_context(|| format!("Failed to fetch note history in {}", repo))?;

        let items: Vec<Item> = dated
            .into_iter()
            .map(|(note, date)| {
                let title = note.title();
                let url = note
                    .html_url
                    .unwrap_or_else(|| format!("https://github.com/{}/blob/HEAD/{}", repo, note.path));
                Item::new(title, url, date)
            })
            .collect();

        info!(count = items.len(), %repo, "fetched notes from repository");
        Ok(select_latest(items, options.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_json(name: &str, private: bool) -> String {
        format!(
            r#"{{"name":"{}","html_url":"https://github.com/octo/{}","private":{},
                "created_at":"2024-01-02T03:04:05Z","updated_at":"2024-05-06T07:08:09Z"}}"#,
            name, name, private
        )
    }

    #[test]
    fn test_repository_item_uses_sort_key_date() {
        let repo: Repository = serde_json::from_str(&repo_json("tool", false)).unwrap();
        let created = repo.clone().into_item(SortKey::Created).unwrap();
        let updated = repo.into_item(SortKey::Updated).unwrap();
        assert_eq!(created.date.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert_eq!(updated.date.to_rfc3339(), "2024-05-06T07:08:09+00:00");
    }

    #[test]
    fn test_repository_without_date_is_dropped() {
        let repo: Repository = serde_json::from_str(
            r#"{"name":"x","html_url":"https://github.com/octo/x","updated_at":null}"#,
        )
        .unwrap();
        assert!(repo.into_item(SortKey::Created).is_none());
    }

    #[test]
    fn test_private_and_skipped_repositories_are_not_listed() {
        let private: Repository = serde_json::from_str(&repo_json("secret", true)).unwrap();
        let skipped: Repository = serde_json::from_str(&repo_json("Dotfiles", false)).unwrap();
        let public: Repository = serde_json::from_str(&repo_json("tool", false)).unwrap();
        let skip = vec!["dotfiles".to_string()];

        assert!(!private.is_listed(&skip));
        assert!(!skipped.is_listed(&skip));
        assert!(public.is_listed(&skip));
    }

    #[test]
    fn test_missing_private_flag_defaults_to_public() {
        let repo: Repository = serde_json::from_str(
            r#"{"name":"x","html_url":"https://github.com/octo/x","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(repo.is_listed(&[]));
    }

    fn entry(name: &str, kind: &str) -> ContentEntry {
        ContentEntry {
            name: name.to_string(),
            path: name.to_string(),
            kind: kind.to_string(),
            html_url: None,
        }
    }

    #[test]
    fn test_only_markdown_files_are_notes() {
        assert!(entry("sqlite-tricks.md", "file").is_note());
        assert!(entry("Upper.MD", "file").is_note());
        assert!(!entry("README.md", "file").is_note());
        assert!(!entry("readme.md", "file").is_note());
        assert!(!entry("docs.md", "dir").is_note());
        assert!(!entry("build.py", "file").is_note());
    }

    #[test]
    fn test_note_title_from_file_name() {
        assert_eq!(entry("sqlite-json_tricks.md", "file").title(), "sqlite json tricks");
    }
}
