//! Fetch the three digest lists concurrently and splice them into a document.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::document::{Document, SpliceError, SpliceMode};
use crate::fetch::ListOptions;
use crate::github::GitHubClient;
use crate::models::{Item, Section};
use crate::render::render;
use crate::til::TilClient;

/// Where TIL notes come from.
pub enum NotesSource {
    Datasette(TilClient),
    /// `owner/repo` of a repository of Markdown notes.
    Repository(String),
}

pub struct DigestBuilder {
    github: GitHubClient,
    notes: NotesSource,
    options: ListOptions,
}

/// Rendered fragments, one per section, in [`Section::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub sections: Vec<(Section, String)>,
}

impl DigestBuilder {
    pub fn new(github: GitHubClient, notes: NotesSource, options: ListOptions) -> Self {
        Self {
            github,
            notes,
            options,
        }
    }

    /// Wire up clients from `config`. `options.skip` is extended with the
    /// configured skip list.
    pub fn from_config(config: &Config, mut options: ListOptions) -> Result<Self> {
        let github = GitHubClient::new(&config.api_url, &config.username, config.token.clone())?;

        let notes = match &config.til_repo {
            Some(repo) => NotesSource::Repository(repo.clone()),
            None => NotesSource::Datasette(TilClient::new(&config.til_url)?),
        };

        options.skip.extend(config.skip_repos.iter().cloned());
        Ok(Self::new(github, notes, options))
    }

    async fn latest_notes(&self) -> Result<Vec<Item>> {
        match &self.notes {
            NotesSource::Datasette(client) => client.latest_tils(&self.options).await,
            NotesSource::Repository(repo) => self.github.repo_notes(repo, &self.options).await,
        }
    }

    /// Run the three fetches concurrently. The first fatal error wins.
    pub async fn build(&self) -> Result<Digest> {
        let (repos, releases, notes) = tokio::try_join!(
            self.github.latest_repos(&self.options),
            self.github.latest_releases(&self.options),
            self.latest_notes(),
        )?;

        info!(
            repos = repos.len(),
            releases = releases.len(),
            notes = notes.len(),
            "digest fetched"
        );

        Ok(Digest {
            sections: vec![
                (Section::LatestRepos, render(&repos)),
                (Section::LatestReleases, render(&releases)),
                (Section::LatestTils, render(&notes)),
            ],
        })
    }
}

impl Digest {
    /// Splice every section into `document`. Sections whose markers are
    /// missing are skipped and returned.
    pub fn apply(&self, document: &mut Document) -> Result<Vec<Section>> {
        let mut missing = Vec::new();

        for (section, fragment) in &self.sections {
            match document.splice(section.marker(), fragment, SpliceMode::Block) {
                Ok(()) => {}
                Err(SpliceError::MarkerNotFound { marker }) => {
                    warn!(%marker, "marker pair not found, leaving section untouched");
                    missing.push(*section);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(missing)
    }
}
