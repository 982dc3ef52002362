// src/users/sqlite.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::BTreeSet;

use super::{normalize_email, NewUser, StoreError, User, UserId, UserStore};
use crate::region::Region;

/// Common SELECT fields for user queries
const SELECT_USER: &str = r#"
    SELECT
        id, username, email, password_hash,
        preferences, country,
        created_at, updated_at
    FROM users
"#;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            preferences TEXT NOT NULL DEFAULT '[]',
            country TEXT NOT NULL DEFAULT 'in',
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    preferences: String,
    country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let preferences: BTreeSet<String> = serde_json::from_str(&row.preferences)
            .map_err(|e| StoreError::Corrupt(format!("preferences for user {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            preferences,
            country: Region::from_stored(&row.country),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("{} WHERE email = ?", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("{} WHERE id = ?", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, preferences, country, created_at, updated_at)
            VALUES (?, ?, ?, '[]', ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(Region::DEFAULT.code())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("user {id} vanished after insert")))
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: BTreeSet<String>,
        country: Region,
    ) -> Result<Option<User>, StoreError> {
        let prefs_json = serde_json::to_string(&preferences)?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                preferences = ?,
                country = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&prefs_json)
        .bind(country.code())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteUserStore {
        // One connection: every sqlite::memory: connection is its own database.
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        SqliteUserStore::new(pool)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "asha".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_email_and_id() {
        let s = store().await;
        let u = s.create(new_user("Asha@Example.com ")).await.unwrap();
        assert_eq!(u.email, "asha@example.com");
        assert_eq!(u.country, Region::In);
        assert!(u.preferences.is_empty());

        let by_email = s.find_by_email("asha@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, u.id);
        let by_id = s.find_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "asha");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let s = store().await;
        s.create(new_user("dup@example.com")).await.unwrap();
        let err = s.create(new_user("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_preferences_round_trips() {
        let s = store().await;
        let u = s.create(new_user("p@example.com")).await.unwrap();
        let prefs: BTreeSet<String> = ["Technology", "AI"].iter().map(|s| s.to_string()).collect();

        let updated = s
            .update_preferences(u.id, prefs.clone(), Region::Gb)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.preferences, prefs);
        assert_eq!(updated.country, Region::Gb);

        assert!(s
            .update_preferences(9999, prefs, Region::Us)
            .await
            .unwrap()
            .is_none());
    }
}
