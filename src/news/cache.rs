// src/news/cache.rs
//! Feed cache backends: Redis for deployments, an in-process map for local runs.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use super::Article;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

/// Key/value store of article lists with a per-entry TTL.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<Article>>, CacheError>;
    async fn set(&self, key: &str, articles: &[Article], ttl: Duration) -> Result<(), CacheError>;
    fn backend(&self) -> &'static str;
}

/// Build a backend from its URL: `memory://` or any redis URL.
pub async fn connect(url: &str) -> Result<Arc<dyn FeedCache>, CacheError> {
    if url.starts_with("memory://") {
        return Ok(Arc::new(MemoryFeedCache::new()));
    }
    Ok(Arc::new(RedisFeedCache::connect(url).await?))
}

/// Redis-backed cache. `ConnectionManager` reconnects on its own.
#[derive(Clone)]
pub struct RedisFeedCache {
    conn: ConnectionManager,
    url: String,
}

impl fmt::Debug for RedisFeedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisFeedCache")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl RedisFeedCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(url, "redis feed cache connected");
        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FeedCache for RedisFeedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Article>>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, articles: &[Article], ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(articles)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, payload, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// In-process cache with absolute TTL (no sliding refresh).
#[derive(Debug, Default)]
pub struct MemoryFeedCache {
    entries: RwLock<HashMap<String, (Instant, Vec<Article>)>>,
}

impl MemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedCache for MemoryFeedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Article>>, CacheError> {
        let now = Instant::now();
        {
            let map = self
                .entries
                .read()
                .map_err(|_| CacheError::Backend("memory cache lock poisoned".into()))?;
            match map.get(key) {
                Some((expires, articles)) if *expires > now => return Ok(Some(articles.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: drop it now rather than waiting for the next write.
        if let Ok(mut map) = self.entries.write() {
            if map.get(key).is_some_and(|(expires, _)| *expires <= now) {
                map.remove(key);
            }
        }
        Ok(None)
    }

    async fn set(&self, key: &str, articles: &[Article], ttl: Duration) -> Result<(), CacheError> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| CacheError::Backend("memory cache lock poisoned".into()))?;
        let now = Instant::now();
        // Keys abandoned after a preference change are never read again.
        map.retain(|_, (expires, _)| *expires > now);
        map.insert(key.to_string(), (now + ttl, articles.to_vec()));
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
