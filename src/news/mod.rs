// src/news/mod.rs
pub mod cache;
pub mod provider;
pub mod query;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use cache::{CacheError, FeedCache, MemoryFeedCache, RedisFeedCache};
pub use provider::{NewsApiClient, NewsProvider, ProviderError};
pub use query::{cache_key, NewsQuery};
pub use resolver::{FeedError, FeedResolver};

/// Publisher reference as reported by NewsAPI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single news article.
///
/// Field names follow the NewsAPI payload so the browser client can render
/// cached and fresh articles the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
