// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod news;
pub mod region;
pub mod summarize;
pub mod users;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::ApiError;
pub use crate::news::{Article, FeedResolver};
pub use crate::region::Region;
pub use crate::summarize::Summarizer;

use axum::Router;

/// Build the full HTTP app (without `/metrics`) from config.
pub async fn app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg).await?;
    Ok(router(state))
}
