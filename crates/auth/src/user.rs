//! User accounts and the store port that persists them.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{Entity, StoreError, UserId};

use crate::Role;

/// Stored account record.
///
/// `password_hash` never leaves the service boundary; responses use
/// [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Normalised (trimmed, lowercase) email. Unique.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// User as exposed to clients (no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Persistence port for accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `StoreError::Conflict` when the email is taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Every account, oldest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("user store lock poisoned"))?;

        if map.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email '{}' already registered", user.email)));
        }

        map.insert(*user.id(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("user store lock poisoned"))?;
        Ok(map.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("user store lock poisoned"))?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("user store lock poisoned"))?;
        let mut users: Vec<User> = map.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }
}
