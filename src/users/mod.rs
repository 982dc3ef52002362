// src/users/mod.rs
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::region::Region;

pub use memory::MemoryUserStore;
pub use sqlite::{create_pool, SqliteUserStore};

pub type UserId = i64;

/// A registered user. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub preferences: BTreeSet<String>,
    pub country: Region,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User already exists")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
    #[error("could not encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for users and their feed preferences.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    /// Overwrite preferences and region. `None` when the user does not exist.
    async fn update_preferences(
        &self,
        id: UserId,
        preferences: BTreeSet<String>,
        country: Region,
    ) -> Result<Option<User>, StoreError>;
}

/// Emails are matched case-insensitively and stored trimmed/lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
