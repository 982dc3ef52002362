// src/auth/mod.rs
//! Credentials, session tokens, and the bearer-token extractor.

pub mod password;
pub mod token;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::api::AppState;
use crate::error::ApiError;
use crate::users::User;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenService};

/// The caller behind a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// Raw token, echoed back by the preferences endpoint.
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?
            .to_string();

        let id = state.tokens.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::unauthorized("Not authorized")
        })?;

        let user = state
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Not authorized"))?;

        Ok(AuthUser { user, token })
    }
}
