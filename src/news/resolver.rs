// src/news/resolver.rs
//! Cache-first feed retrieval.
//!
//! Cache failures are fail-open: read errors fall through to the provider and
//! write errors are only logged. Only provider failures reach the caller.
//! Concurrent misses for the same key each query upstream (no coalescing).

use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use super::cache::FeedCache;
use super::provider::{NewsProvider, ProviderError};
use super::query::{cache_key, NewsQuery};
use super::Article;
use crate::region::Region;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("upstream news provider unavailable: {0}")]
    UpstreamUnavailable(#[from] ProviderError),
}

pub struct FeedResolver {
    provider: Arc<dyn NewsProvider>,
    cache: Option<Arc<dyn FeedCache>>,
    cache_enabled: bool,
    ttl: Duration,
}

impl FeedResolver {
    pub fn new(provider: Arc<dyn NewsProvider>) -> Self {
        Self {
            provider,
            cache: None,
            cache_enabled: false,
            ttl: Duration::from_secs(crate::config::DEFAULT_FEED_CACHE_TTL_SECS),
        }
    }

    /// Attach a cache backend. It is consulted only while `enabled` is true.
    pub fn with_cache(mut self, cache: Arc<dyn FeedCache>, enabled: bool) -> Self {
        self.cache = Some(cache);
        self.cache_enabled = enabled;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn active_cache(&self) -> Option<&Arc<dyn FeedCache>> {
        if self.cache_enabled {
            self.cache.as_ref()
        } else {
            None
        }
    }

    pub async fn get_feed<I>(&self, preferences: I, region: Region) -> Result<Vec<Article>, FeedError>
    where
        I: IntoIterator + Clone,
        I::Item: AsRef<str>,
    {
        self.get_feed_at(preferences, region, Utc::now()).await
    }

    /// Same as [`get_feed`](Self::get_feed) with an explicit clock for the search window.
    pub async fn get_feed_at<I>(
        &self,
        preferences: I,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Vec<Article>, FeedError>
    where
        I: IntoIterator + Clone,
        I::Item: AsRef<str>,
    {
        let key = cache_key(preferences.clone(), region);
        let cache = self.active_cache();

        if let Some(cache) = cache {
            match cache.get(&key).await {
                Ok(Some(articles)) => {
                    counter!("feed_cache_hits_total").increment(1);
                    tracing::debug!(%key, backend = cache.backend(), "feed cache hit");
                    return Ok(articles);
                }
                Ok(None) => {
                    counter!("feed_cache_misses_total").increment(1);
                    tracing::debug!(%key, backend = cache.backend(), "feed cache miss");
                }
                Err(e) => {
                    counter!("feed_cache_errors_total", "op" => "read").increment(1);
                    tracing::warn!(%key, error = %e, "feed cache read failed, querying upstream");
                }
            }
        }

        let query = NewsQuery::for_preferences(preferences, region, now);
        let articles = match self.provider.fetch(&query).await {
            Ok(articles) => articles,
            Err(e) => {
                counter!("feed_upstream_errors_total").increment(1);
                tracing::error!(
                    provider = self.provider.name(),
                    endpoint = query.endpoint(),
                    error = %e,
                    "news provider request failed"
                );
                return Err(FeedError::UpstreamUnavailable(e));
            }
        };

        if let Some(cache) = cache {
            spawn_cache_write(Arc::clone(cache), key, articles.clone(), self.ttl);
        }

        Ok(articles)
    }
}

/// Detached write: the response never waits on it and errors are only logged.
fn spawn_cache_write(cache: Arc<dyn FeedCache>, key: String, articles: Vec<Article>, ttl: Duration) {
    tokio::spawn(async move {
        match cache.set(&key, &articles, ttl).await {
            Ok(()) => tracing::debug!(%key, ttl_secs = ttl.as_secs(), "feed cached"),
            Err(e) => {
                counter!("feed_cache_errors_total", "op" => "write").increment(1);
                tracing::warn!(%key, error = %e, "feed cache write failed");
            }
        }
    });
}
