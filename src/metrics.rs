use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the feed cache TTL.
    ///
    /// Only one recorder can be installed per process.
    pub fn init(feed_cache_ttl_secs: u64) -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("feed_cache_hits_total", "Feeds served from cache.");
        describe_counter!("feed_cache_misses_total", "Feed cache lookups without an entry.");
        describe_counter!(
            "feed_cache_errors_total",
            "Feed cache read/write failures (fail-open)."
        );
        describe_counter!("feed_upstream_errors_total", "News provider failures.");
        describe_counter!(
            "summary_provider_success_total",
            "Summaries produced by an AI provider."
        );
        describe_counter!(
            "summary_provider_errors_total",
            "AI provider failures or empty answers."
        );
        describe_counter!(
            "summary_fallback_total",
            "Summaries produced by the local extractive fallback."
        );
        describe_gauge!("feed_cache_ttl_secs", "Feed cache entry TTL in seconds.");

        // Absolute TTL, no sliding refresh
        gauge!("feed_cache_ttl_secs").set(feed_cache_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
