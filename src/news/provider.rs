// src/news/provider.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::query::NewsQuery;
use super::Article;
use crate::config::NewsConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("news API key is not configured")]
    MissingApiKey,
    #[error("news API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("news API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Upstream source of articles.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>, ProviderError>;
    fn name(&self) -> &'static str;
}

/// NewsAPI.org client (`/v2/everything` and `/v2/top-headlines`).
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(http: reqwest::Client, cfg: &NewsConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Shared HTTP client used for every outbound call the service makes.
    pub fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("news-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
    }

    pub fn url_for(&self, query: &NewsQuery) -> String {
        format!("{}/{}", self.base_url, query.endpoint())
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let resp = self
            .http
            .get(self.url_for(query))
            .header("X-Api-Key", &self.api_key)
            .query(&query.params())
            .send()
            .await?;

        let status = resp.status();
        let body: NewsApiResponse = resp.json().await?;

        if !status.is_success() || body.status != "ok" {
            let message = match (body.code, body.message) {
                (Some(code), Some(msg)) => format!("{code}: {msg}"),
                (None, Some(msg)) => msg,
                (Some(code), None) => code,
                (None, None) => format!("status '{}'", body.status),
            };
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(
            endpoint = query.endpoint(),
            count = body.articles.len(),
            "news API fetch ok"
        );
        Ok(body.articles)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
