use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const USER_AGENT: &str = "readme-digest/0.1";

/// Thin JSON-over-HTTP wrapper shared by every source.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, token })
    }

    /// Client without credentials, for endpoints outside GitHub.
    pub fn anonymous() -> Result<Self> {
        Self::new(None)
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json, application/json");

        match &self.token {
            Some(token) => request.header("Authorization", format!("token {}", token)),
            None => request,
        }
    }

    /// GET `url` and decode the body. Any non-success status is an error.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .request(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        Self::decode(url, response).await
    }

    /// GET `url`, treating a 404 or a transport failure as an absent resource.
    ///
    /// Other non-success statuses (rate limiting, server errors) are still
    /// returned as errors.
    pub async fn get_optional_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!(%url, "GET (optional)");
        let response = match self.request(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "request failed, treating resource as absent");
                return Ok(None);
            }
        };

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%url, "not found");
            return Ok(None);
        }

        Self::decode(url, response).await.map(Some)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("{} returned error: {} - {}", url, status, error_text.trim());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}
