use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::models::{FailurePolicy, Item, SortKey};

pub const DEFAULT_LIMIT: usize = 5;

/// Upper bound on in-flight per-item requests.
const RELATED_CONCURRENCY: usize = 10;

/// A JSON record from a list endpoint that can become an [`Item`].
pub trait ListRecord: DeserializeOwned {
    /// Whether the record belongs in the digest at all.
    fn is_listed(&self, skip: &[String]) -> bool;

    /// Convert to an item dated by `sort_key`. `None` drops the record.
    fn into_item(self, sort_key: SortKey) -> Option<Item>;
}

/// List endpoints answer either with a bare array or a search envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<R> {
    Bare(Vec<R>),
    Envelope { items: Vec<R> },
}

impl<R> Listing<R> {
    fn into_records(self) -> Vec<R> {
        match self {
            Listing::Bare(records) => records,
            Listing::Envelope { items } => items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub limit: usize,
    pub skip: Vec<String>,
    pub policy: FailurePolicy,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: Vec::new(),
            policy: FailurePolicy::Fatal,
        }
    }
}

/// Fetch the raw records behind a list endpoint, honouring the failure policy.
pub async fn fetch_records<R: DeserializeOwned>(
    client: &ApiClient,
    url: &str,
    policy: FailurePolicy,
) -> Result<Vec<R>> {
    match client.get_json::<Listing<R>>(url).await {
        Ok(listing) => Ok(listing.into_records()),
        Err(e) => match policy {
            FailurePolicy::Fatal => Err(e),
            FailurePolicy::Empty => {
                let error = format!("{:#}", e);
                warn!(%url, %error, "list fetch failed, using an empty list");
                Ok(Vec::new())
            }
        },
    }
}

/// Fetch a list endpoint and return its newest `options.limit` items.
pub async fn fetch_list<R: ListRecord>(
    client: &ApiClient,
    url: &str,
    sort_key: SortKey,
    options: &ListOptions,
) -> Result<Vec<Item>> {
    let records: Vec<R> = fetch_records(client, url, options.policy).await?;
    let fetched = records.len();

    let items: Vec<Item> = records
        .into_iter()
        .filter(|record| record.is_listed(&options.skip))
        .filter_map(|record| record.into_item(sort_key))
        .collect();

    debug!(%url, fetched, kept = items.len(), "list fetched");
    Ok(select_latest(items, options.limit))
}

/// Newest first, at most `limit` entries. Ties keep their input order.
pub fn select_latest(mut items: Vec<Item>, limit: usize) -> Vec<Item> {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit);
    items
}

/// Fetch one related resource per entry, concurrently.
///
/// `fetch` yields `Ok(None)` when the resource does not exist; that entry is
/// dropped and the rest are kept in their original order. An `Err` from any
/// entry aborts the whole call.
pub async fn fetch_related<T, S, F, Fut>(entries: Vec<T>, fetch: F) -> Result<Vec<(T, S)>>
where
    F: Fn(&T) -> Fut,
    Fut: Future<Output = Result<Option<S>>>,
{
    let results: Vec<Result<Option<S>>> = stream::iter(entries.iter().map(&fetch))
        .buffered(RELATED_CONCURRENCY)
        .collect()
        .await;

    let mut related = Vec::with_capacity(entries.len());
    for (entry, result) in entries.into_iter().zip(results) {
        match result? {
            Some(sub) => related.push((entry, sub)),
            None => debug!("related resource absent, dropping entry"),
        }
    }

    Ok(related)
}
