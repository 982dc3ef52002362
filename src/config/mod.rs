//! Process configuration: defaults, then an optional TOML file, then env vars.

pub mod ai;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::AiConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "APP_CONFIG_PATH";

pub const DEFAULT_FEED_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://news.db?mode=rwc";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub http_timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
            http_timeout_secs: 10,
        }
    }
}

/// Feed cache settings.
///
/// `enabled` is the on/off switch; `url` says which backend to use
/// (`redis://...` or `memory://`). Caching is active only when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            ttl_secs: DEFAULT_FEED_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub database: DatabaseConfig,
    pub news: NewsConfig,
    pub cache: CacheConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    /// Load config using env var + fallbacks:
    /// 1) $APP_CONFIG_PATH (must exist when set)
    /// 2) config/app.toml (optional)
    ///
    /// Environment variables override file values.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("APP_CONFIG_PATH points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env_string("JWT_SECRET") {
            self.jwt_secret = v;
        }

        if let Some(v) = env_string("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(n) = env_parse::<u32>("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = n;
        }

        if let Some(v) = env_string("NEWS_API_KEY") {
            self.news.api_key = v;
        }
        if let Some(v) = env_string("NEWS_API_BASE_URL") {
            self.news.base_url = v;
        }
        if let Some(n) = env_parse::<u64>("HTTP_TIMEOUT_SECS") {
            self.news.http_timeout_secs = n;
        }

        if let Some(b) = env_bool("CACHE_ENABLED") {
            self.cache.enabled = b;
        }
        if let Some(v) = env_string("CACHE_URL").or_else(|| env_string("REDIS_URL")) {
            self.cache.url = Some(v);
        }
        if let Some(n) = env_parse::<u64>("FEED_CACHE_TTL_SECS") {
            self.cache.ttl_secs = n;
        }

        self.ai.apply_env();
    }

    fn validate(&mut self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("Missing JWT_SECRET env var");
        }
        if self.cache.ttl_secs == 0 {
            self.cache.ttl_secs = DEFAULT_FEED_CACHE_TTL_SECS;
        }
        if self.database.max_connections == 0 {
            self.database.max_connections = 1;
        }
        if self.news.api_key.is_empty() {
            tracing::warn!("NEWS_API_KEY is not set; /api/news will fail upstream");
        }
        Ok(())
    }

    /// True when the feed resolver should consult a cache backend.
    pub fn cache_active(&self) -> bool {
        self.cache.enabled && self.cache.url.is_some()
    }
}

pub(crate) fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    env_string(name).map(|v| {
        matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
