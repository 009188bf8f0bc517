use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::client::ApiClient;
use crate::fetch::{fetch_records, select_latest, ListOptions};
use crate::models::Item;

/// Row of the Datasette `til` table.
#[derive(Debug, Clone, Deserialize)]
pub struct Til {
    pub title: Option<String>,
    pub url: Option<String>,
    pub topic: Option<String>,
    pub slug: Option<String>,
    pub created_utc: Option<String>,
}

impl Til {
    /// The row's own URL, or `{site}/{topic}/{slug}` when it has none.
    fn link(&self, site: &Url) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        let (topic, slug) = (self.topic.as_deref()?, self.slug.as_deref()?);
        site.join(&format!("{}/{}", topic, slug)).ok().map(String::from)
    }

    fn into_item(self, site: &Url) -> Option<Item> {
        let Some(title) = self.title.clone().filter(|t| !t.trim().is_empty()) else {
            debug!(slug = ?self.slug, "skipping note without a title");
            return None;
        };
        let Some(date) = self.created_utc.as_deref().and_then(parse_timestamp) else {
            debug!(%title, created = ?self.created_utc, "skipping note with unreadable date");
            return None;
        };
        let Some(link) = self.link(site) else {
            debug!(%title, "skipping note without a link");
            return None;
        };
        Some(Item::new(title, link, date))
    }
}

/// Accepts RFC 3339 as well as the offset-less forms SQLite tends to store.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Client for a Datasette instance exposing a `til` table as JSON.
pub struct TilClient {
    client: ApiClient,
    endpoint: Url,
}

impl TilClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid TIL_URL: {}", endpoint))?;
        Ok(Self {
            client: ApiClient::anonymous()?,
            endpoint,
        })
    }

    pub async fn latest_tils(&self, options: &ListOptions) -> Result<Vec<Item>> {
        let sql = format!(
            "select path, title, url, topic, slug, created_utc from til order by created_utc desc limit {}",
            options.limit
        );

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("sql", &sql)
            .append_pair("_shape", "array");

        let rows: Vec<Til> = fetch_records(&self.client, url.as_str(), options.policy)
            .await
            .context("Failed to fetch latest TILs")?;

        let site = self
            .endpoint
            .join("/")
            .context("TIL_URL cannot be used as a base URL")?;
        let tils: Vec<Item> = rows
            .into_iter()
            .filter_map(|til| til.into_item(&site))
            .collect();

        info!(count = tils.len(), "fetched latest TILs");
        Ok(select_latest(tils, options.limit))
    }
}
