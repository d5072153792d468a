use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::accounts::error::{AccountError, AccountResult, StoreError};
use crate::accounts::password::{hash_password, verify_password};
use crate::accounts::repo::UserStore;
use crate::accounts::repo_types::{NewUser, PublicUser};

/// Credential verification and registration over an injected store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Check `username`/`password` against the store. Unknown users and wrong
    /// passwords both yield `Unauthorized`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> AccountResult<PublicUser> {
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::Validation("Username and password are required"));
        }

        debug!("querying store for user");
        let Some(user) = self.store.find_by_username(username).await? else {
            warn!("login unknown username");
            return Err(AccountError::Unauthorized);
        };

        if !verify_password(password, &user.password)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AccountError::Unauthorized);
        }

        info!(user_id = user.id, "user logged in");
        Ok(user.into())
    }

    /// Create a user after checking that `username` is free. Returns the new id.
    #[instrument(skip(self, password, email))]
    pub async fn register(&self, username: &str, password: &str, email: &str) -> AccountResult<i64> {
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AccountError::Validation("All fields are required"));
        }

        if self.store.username_exists(username).await? {
            warn!("username already registered");
            return Err(AccountError::DuplicateUsername);
        }

        let id = self.insert(username, password, Some(email)).await?;
        info!(user_id = id, "user registered");
        Ok(id)
    }

    /// Create the account unless `username` is taken. Returns whether a
    /// record was inserted.
    pub async fn ensure_account(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> AccountResult<bool> {
        if self.store.username_exists(username).await? {
            return Ok(false);
        }
        self.insert(username, password, email).await?;
        Ok(true)
    }

    /// Round-trip the store with `SELECT 1 + 1`.
    pub async fn check_store(&self) -> Result<i32, StoreError> {
        self.store.ping().await
    }

    async fn insert(&self, username: &str, password: &str, email: Option<&str>) -> AccountResult<i64> {
        let password_hash = hash_password(password)?;
        let id = self
            .store
            .insert(NewUser {
                username: username.to_owned(),
                password_hash,
                email: email.map(str::to_owned),
            })
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod test_stores {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::accounts::memory::InMemoryUserStore;
    use crate::accounts::repo_types::User;

    /// Wraps the in-memory store and counts every store call.
    #[derive(Default)]
    pub struct CountingStore {
        pub inner: InMemoryUserStore,
        pub calls: AtomicUsize,
    }

    impl CountingStore {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn migrate(&self) -> Result<(), StoreError> {
            self.hit();
            self.inner.migrate().await
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.hit();
            self.inner.find_by_username(username).await
        }
        async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
            self.hit();
            self.inner.username_exists(username).await
        }
        async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
            self.hit();
            self.inner.insert(user).await
        }
        async fn ping(&self) -> Result<i32, StoreError> {
            self.hit();
            self.inner.ping().await
        }
    }

    /// Store whose every call fails as if the database were down.
    pub struct UnreachableStore;

    fn down() -> StoreError {
        StoreError::Unavailable("connect ECONNREFUSED 127.0.0.1:5432".into())
    }

    #[async_trait]
    impl UserStore for UnreachableStore {
        async fn migrate(&self) -> Result<(), StoreError> {
            Err(down())
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(down())
        }
        async fn username_exists(&self, _username: &str) -> Result<bool, StoreError> {
            Err(down())
        }
        async fn insert(&self, _user: NewUser) -> Result<i64, StoreError> {
            Err(down())
        }
        async fn ping(&self) -> Result<i32, StoreError> {
            Err(down())
        }
    }

    #[derive(Debug)]
    struct FakeDbError {
        code: &'static str,
        unique: bool,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.code)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    /// A server-side database error carrying SQLSTATE `code`.
    pub fn db_error(code: &'static str, unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { code, unique }))
    }

    /// Store whose `users` table is missing (SQLSTATE 42P01).
    pub struct MissingTableStore;

    fn undefined_table() -> StoreError {
        StoreError::Database(db_error("42P01", false))
    }

    #[async_trait]
    impl UserStore for MissingTableStore {
        async fn migrate(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(undefined_table())
        }
        async fn username_exists(&self, _username: &str) -> Result<bool, StoreError> {
            Err(undefined_table())
        }
        async fn insert(&self, _user: NewUser) -> Result<i64, StoreError> {
            Err(undefined_table())
        }
        async fn ping(&self) -> Result<i32, StoreError> {
            Ok(2)
        }
    }
}
