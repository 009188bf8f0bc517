use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_USERNAME: &str = "candelakechkian";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIL_URL: &str = "https://til.simonwillison.net/tils.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub token: Option<String>,
    /// `owner/repo` holding TIL notes. When set, notes are read from the
    /// repository instead of the Datasette endpoint.
    pub til_repo: Option<String>,
    pub til_url: String,
    pub api_url: String,
    pub skip_repos: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let username = get("GITHUB_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        if username.contains('/') {
            anyhow::bail!("GITHUB_USERNAME must be a bare account name, got '{}'", username);
        }

        let til_repo = get("TIL_REPO")
            .map(|repo| Self::qualify_repo(&username, &repo))
            .transpose()
            .context("TIL_REPO should look like 'owner/repo' or 'repo'")?;

        let api_url = get("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let skip_repos = get("README_SKIP_REPOS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            token: get("GITHUB_TOKEN"),
            til_url: get("TIL_URL").unwrap_or_else(|| DEFAULT_TIL_URL.to_string()),
            username,
            til_repo,
            api_url,
            skip_repos,
        })
    }

    fn qualify_repo(username: &str, repo: &str) -> Result<String> {
        match repo.split_once('/') {
            None => Ok(format!("{}/{}", username, repo)),
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(repo.to_string())
            }
            Some(_) => anyhow::bail!("Invalid repository identifier: {}", repo),
        }
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/readme-digest/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("readme-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // Nothing found is fine: CI sets the variables directly.
    }
}
