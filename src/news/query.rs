// src/news/query.rs
//! Cache key derivation and upstream query construction.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::region::Region;

/// Sentinel used in cache keys when the user has no topic preferences.
pub const TOP_HEADLINES_SENTINEL: &str = "top-headlines";

/// How far back topic searches reach.
pub const SEARCH_WINDOW_DAYS: u64 = 3;

/// Sorted, de-duplicated, non-empty preference list.
pub fn sorted_preferences<I>(preferences: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = preferences
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// `news:<region>:<sorted,prefs>` or `news:<region>:top-headlines`.
///
/// Independent of the order preferences were selected in.
pub fn cache_key<I>(preferences: I, region: Region) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let prefs = sorted_preferences(preferences);
    let tail = if prefs.is_empty() {
        TOP_HEADLINES_SENTINEL.to_string()
    } else {
        prefs.join(",")
    };
    format!("news:{}:{}", region.code(), tail)
}

/// A request against the upstream news API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    /// Country headlines; no date or sort filter.
    TopHeadlines { country: Region },
    /// Full-text search restricted to recent articles, newest first.
    Everything { q: String, from: NaiveDate },
}

impl NewsQuery {
    /// Build the query for a preference set as of `now`.
    pub fn for_preferences<I>(preferences: I, region: Region, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let prefs = sorted_preferences(preferences);
        if prefs.is_empty() {
            return NewsQuery::TopHeadlines { country: region };
        }

        let q = format!("({}) AND {}", prefs.join(" OR "), region.display_name());
        let from = now
            .date_naive()
            .checked_sub_days(Days::new(SEARCH_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);
        NewsQuery::Everything { q, from }
    }

    /// Endpoint path relative to the API base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            NewsQuery::TopHeadlines { .. } => "top-headlines",
            NewsQuery::Everything { .. } => "everything",
        }
    }

    /// Query-string parameters, excluding the API key.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            NewsQuery::TopHeadlines { country } => vec![("country", country.code().to_string())],
            NewsQuery::Everything { q, from } => vec![
                ("q", q.clone()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("language", "en".to_string()),
            ],
        }
    }
}
