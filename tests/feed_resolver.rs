// tests/feed_resolver.rs
//
// Feed resolver behavior against fake providers and caches.
//
// Covered:
// - warm cache short-circuits the provider (call-count assertion)
// - cache read errors fall through to the provider (fail-open)
// - misses populate the cache in the background; failed writes are invisible
// - disabled cache flag bypasses a configured backend
// - exact upstream query forms for topic and top-headlines feeds
// - provider failure surfaces as UpstreamUnavailable

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use news_digest::news::{
    cache_key, Article, CacheError, FeedCache, FeedError, FeedResolver, MemoryFeedCache,
    NewsProvider, NewsQuery, ProviderError,
};
use news_digest::Region;

// --- fakes ---

#[derive(Default)]
struct FakeProvider {
    calls: AtomicUsize,
    queries: Mutex<Vec<NewsQuery>>,
    fail: bool,
}

impl FakeProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_query(&self) -> Option<NewsQuery> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NewsProvider for FakeProvider {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(ProviderError::Api {
                status: 429,
                message: "rateLimited: too many requests".into(),
            });
        }
        Ok(vec![article("fresh")])
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Cache whose reads and/or writes always fail.
struct BrokenCache {
    fail_reads: bool,
    writes: AtomicUsize,
}

#[async_trait]
impl FeedCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<Article>>, CacheError> {
        if self.fail_reads {
            Err(CacheError::Backend("connection refused".into()))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, _key: &str, _articles: &[Article], _ttl: Duration) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("READONLY replica".into()))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

fn article(title: &str) -> Article {
    Article {
        title: title.to_string(),
        url: format!("https://example.com/{title}"),
        ..Default::default()
    }
}

fn prefs(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Poll until the detached cache write lands (or give up).
async fn wait_for_entry(cache: &MemoryFeedCache, key: &str) -> Option<Vec<Article>> {
    for _ in 0..100 {
        if let Some(hit) = cache.get(key).await.unwrap() {
            return Some(hit);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

// --- tests ---

#[tokio::test]
async fn warm_cache_is_returned_without_calling_provider() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(MemoryFeedCache::new());
    let p = prefs(&["Technology", "AI"]);

    cache
        .set(&cache_key(&p, Region::In), &[article("cached")], Duration::from_secs(60))
        .await
        .unwrap();

    let resolver = FeedResolver::new(provider.clone()).with_cache(cache.clone(), true);
    let feed = resolver.get_feed(&p, Region::In).await.unwrap();

    assert_eq!(feed, vec![article("cached")]);
    assert_eq!(provider.calls(), 0, "cache hit must not touch upstream");
}

#[tokio::test]
async fn cache_hit_is_independent_of_preference_order() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(MemoryFeedCache::new());
    cache
        .set(
            &cache_key(["Sports", "AI"], Region::Us),
            &[article("cached")],
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let resolver = FeedResolver::new(provider.clone()).with_cache(cache, true);
    let feed = resolver
        .get_feed(vec!["AI".to_string(), "Sports".to_string()], Region::Us)
        .await
        .unwrap();

    assert_eq!(feed[0].title, "cached");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn cache_read_error_falls_through_to_provider() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(BrokenCache {
        fail_reads: true,
        writes: AtomicUsize::new(0),
    });

    let resolver = FeedResolver::new(provider.clone()).with_cache(cache, true);
    let feed = resolver.get_feed(&prefs(&["AI"]), Region::In).await.unwrap();

    assert_eq!(feed, vec![article("fresh")]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn cache_write_failure_does_not_affect_response() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(BrokenCache {
        fail_reads: false,
        writes: AtomicUsize::new(0),
    });

    let resolver = FeedResolver::new(provider.clone()).with_cache(cache.clone(), true);
    let feed = resolver.get_feed(&prefs(&[]), Region::Gb).await.unwrap();
    assert_eq!(feed.len(), 1);

    // The write is attempted in the background and its error swallowed.
    for _ in 0..100 {
        if cache.writes.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn miss_populates_cache_then_second_call_hits() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(MemoryFeedCache::new());
    let p = prefs(&["AI"]);
    let key = cache_key(&p, Region::Ca);

    let resolver = FeedResolver::new(provider.clone())
        .with_cache(cache.clone(), true)
        .with_ttl(Duration::from_secs(3600));

    resolver.get_feed(&p, Region::Ca).await.unwrap();
    assert_eq!(provider.calls(), 1);

    let stored = wait_for_entry(&cache, &key).await;
    assert_eq!(stored, Some(vec![article("fresh")]));

    resolver.get_feed(&p, Region::Ca).await.unwrap();
    assert_eq!(provider.calls(), 1, "second request should be served from cache");
}

#[tokio::test]
async fn disabled_flag_bypasses_configured_cache() {
    let provider = Arc::new(FakeProvider::default());
    let cache = Arc::new(MemoryFeedCache::new());
    let p = prefs(&["AI"]);
    cache
        .set(&cache_key(&p, Region::In), &[article("cached")], Duration::from_secs(60))
        .await
        .unwrap();

    let resolver = FeedResolver::new(provider.clone()).with_cache(cache.clone(), false);
    let feed = resolver.get_feed(&p, Region::In).await.unwrap();

    assert_eq!(feed, vec![article("fresh")]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn topic_feed_issues_exact_search_query() {
    let provider = Arc::new(FakeProvider::default());
    let resolver = FeedResolver::new(provider.clone());
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();

    resolver
        .get_feed_at(&prefs(&["Technology", "AI"]), Region::In, now)
        .await
        .unwrap();

    assert_eq!(
        provider.last_query(),
        Some(NewsQuery::Everything {
            q: "(AI OR Technology) AND India".to_string(),
            from: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        })
    );
}

#[tokio::test]
async fn empty_preferences_issue_top_headlines_without_date_filter() {
    let provider = Arc::new(FakeProvider::default());
    let resolver = FeedResolver::new(provider.clone());

    resolver.get_feed(&prefs(&[]), Region::Au).await.unwrap();

    let q = provider.last_query().expect("provider called");
    assert_eq!(q, NewsQuery::TopHeadlines { country: Region::Au });
    assert!(q.params().iter().all(|(k, _)| *k != "from" && *k != "sortBy"));
}

#[tokio::test]
async fn provider_failure_is_upstream_unavailable_and_not_cached() {
    let provider = Arc::new(FakeProvider::failing());
    let cache = Arc::new(MemoryFeedCache::new());
    let resolver = FeedResolver::new(provider.clone()).with_cache(cache.clone(), true);

    let err = resolver.get_feed(&prefs(&["AI"]), Region::In).await.unwrap_err();
    assert!(matches!(err, FeedError::UpstreamUnavailable(_)));
    assert_eq!(provider.calls(), 1, "no retry on provider failure");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.is_empty());
}
