use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{AuthUser, TokenService};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::news::{cache, Article, FeedResolver, NewsApiClient};
use crate::region::Region;
use crate::summarize::Summarizer;
use crate::users::{create_pool, NewUser, SqliteUserStore, UserId, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
    pub feed: Arc<FeedResolver>,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    /// Wire production collaborators from config.
    ///
    /// A cache backend that cannot be reached at startup is skipped with a
    /// warning; the service then runs uncached.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&cfg.database.url, cfg.database.max_connections)
            .await
            .with_context(|| format!("opening database {}", cfg.database.url))?;
        let users: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));

        let http = NewsApiClient::http_client(cfg.news.http_timeout_secs)
            .context("building HTTP client")?;
        let provider = Arc::new(NewsApiClient::new(http.clone(), &cfg.news));

        let mut feed = FeedResolver::new(provider).with_ttl(Duration::from_secs(cfg.cache.ttl_secs));
        if let Some(url) = cfg.cache.url.as_deref() {
            match cache::connect(url).await {
                Ok(backend) => {
                    tracing::info!(
                        backend = backend.backend(),
                        enabled = cfg.cache.enabled,
                        ttl_secs = cfg.cache.ttl_secs,
                        "feed cache configured"
                    );
                    feed = feed.with_cache(backend, cfg.cache.enabled);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "feed cache unavailable, serving uncached");
                }
            }
        }

        let summarizer = Summarizer::from_config(&cfg.ai, http);
        tracing::info!(providers = ?summarizer.provider_names(), "summary providers");

        Ok(Self {
            users,
            tokens: Arc::new(TokenService::new(&cfg.jwt_secret)),
            feed: Arc::new(feed),
            summarizer: Arc::new(summarizer),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "API is running..." }))
        .route("/health", get(|| async { "OK" }))
        .route("/api/users", post(register_user))
        .route("/api/users/login", post(login_user))
        .route("/api/users/me", get(get_me))
        .route("/api/users/preferences", put(update_preferences))
        .route("/api/news", get(get_news))
        .route("/api/ai/summarize", post(summarize_news))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `Json` whose rejections render as [`ApiError::BadRequest`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct AppJson<T>(T);

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ---- users ----

#[derive(Deserialize)]
struct RegisterReq {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct RegisterResp {
    id: UserId,
    username: String,
    email: String,
    token: String,
}

async fn register_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterReq>,
) -> ApiResult<(StatusCode, Json<RegisterResp>)> {
    let (Some(username), Some(email), Some(password)) = (
        non_empty(body.username),
        non_empty(body.email),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Please add all fields"));
    };

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password_blocking(password)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .users
        .create(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    let token = issue_token(&state, user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResp {
            id: user.id,
            username: user.username,
            email: user.email,
            token,
        }),
    ))
}

#[derive(Deserialize)]
struct LoginReq {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResp {
    id: UserId,
    username: String,
    email: String,
    token: String,
    preferences: BTreeSet<String>,
}

async fn login_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginReq>,
) -> ApiResult<Json<LoginResp>> {
    let invalid = || ApiError::bad_request("Invalid credentials");

    let (Some(email), Some(password)) = (non_empty(body.email), body.password) else {
        return Err(invalid());
    };
    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password_blocking(password, user.password_hash.clone()).await {
        return Err(invalid());
    }

    let token = issue_token(&state, user.id)?;
    Ok(Json(LoginResp {
        id: user.id,
        username: user.username,
        email: user.email,
        token,
        preferences: user.preferences,
    }))
}

async fn get_me(auth: AuthUser) -> Json<crate::users::User> {
    Json(auth.user)
}

#[derive(Deserialize)]
struct PreferencesReq {
    preferences: Option<Vec<String>>,
    country: Option<String>,
}

#[derive(Serialize)]
struct PreferencesResp {
    id: UserId,
    username: String,
    email: String,
    preferences: BTreeSet<String>,
    country: Region,
    token: String,
}

async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(body): AppJson<PreferencesReq>,
) -> ApiResult<Json<PreferencesResp>> {
    let AuthUser { user, token } = auth;

    let preferences = match body.preferences {
        Some(list) => list
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        None => user.preferences,
    };
    let country = match non_empty(body.country) {
        Some(code) => code
            .parse::<Region>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => user.country,
    };

    let updated = state
        .users
        .update_preferences(user.id, preferences, country)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PreferencesResp {
        id: updated.id,
        username: updated.username,
        email: updated.email,
        preferences: updated.preferences,
        country: updated.country,
        token,
    }))
}

fn issue_token(state: &AppState, id: UserId) -> ApiResult<String> {
    state
        .tokens
        .issue(id)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

// ---- news ----

async fn get_news(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Article>>> {
    let articles = state
        .feed
        .get_feed(&auth.user.preferences, auth.user.country)
        .await?;
    Ok(Json(articles))
}

// ---- ai ----

#[derive(Deserialize)]
struct SummarizeReq {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct SummarizeResp {
    summary: String,
}

async fn summarize_news(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppJson(body): AppJson<SummarizeReq>,
) -> ApiResult<Json<SummarizeResp>> {
    let title = body.title.unwrap_or_default();
    let text = body.text.unwrap_or_default();
    if title.trim().is_empty() && text.trim().is_empty() {
        return Err(ApiError::bad_request("No content to summarize"));
    }

    let summary = state.summarizer.summarize(&title, &text).await;
    Ok(Json(SummarizeResp { summary }))
}
