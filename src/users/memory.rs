// src/users/memory.rs
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use super::{normalize_email, NewUser, StoreError, User, UserId, UserStore};
use crate::region::Region;

/// Process-local user store for tests and throwaway local runs.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: UserId,
    users: HashMap<UserId, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("user store mutex poisoned").users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let g = self.inner.lock().expect("user store mutex poisoned");
        Ok(g.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let g = self.inner.lock().expect("user store mutex poisoned");
        Ok(g.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let email = normalize_email(&user.email);
        let mut g = self.inner.lock().expect("user store mutex poisoned");
        if g.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        g.next_id += 1;
        let now = Utc::now();
        let created = User {
            id: g.next_id,
            username: user.username,
            email,
            password_hash: user.password_hash,
            preferences: BTreeSet::new(),
            country: Region::DEFAULT,
            created_at: now,
            updated_at: now,
        };
        g.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_preferences(
        &self,
        id: UserId,
        preferences: BTreeSet<String>,
        country: Region,
    ) -> Result<Option<User>, StoreError> {
        let mut g = self.inner.lock().expect("user store mutex poisoned");
        let Some(user) = g.users.get_mut(&id) else {
            return Ok(None);
        };
        user.preferences = preferences;
        user.country = country;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}
