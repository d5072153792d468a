use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::accounts::error::StoreError;
use crate::accounts::repo::UserStore;
use crate::accounts::repo_types::{NewUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, User>,
    last_id: i64,
}

/// In-process `UserStore` used with `USER_STORE=memory` and in tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.contains_key(username))
    }

    async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::UniqueViolation(user.username));
        }

        inner.last_id += 1;
        let id = inner.last_id;
        inner.users.insert(
            user.username.clone(),
            User {
                id,
                username: user.username,
                password: user.password_hash,
                email: user.email,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(id)
    }

    async fn ping(&self) -> Result<i32, StoreError> {
        Ok(2)
    }
}
