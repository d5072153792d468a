use async_trait::async_trait;
use sqlx::PgPool;

use crate::accounts::error::StoreError;
use crate::accounts::repo_types::{NewUser, User};

/// Persistence seam for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the users table if it does not exist yet.
    async fn migrate(&self) -> Result<(), StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert a user and return the store-assigned id.
    async fn insert(&self, user: NewUser) -> Result<i64, StoreError>;

    /// Round-trip a trivial query (`SELECT 1 + 1`).
    async fn ping(&self) -> Result<i32, StoreError>;
}

/// A lost race on the username constraint becomes `UniqueViolation`.
fn insert_error(e: sqlx::Error, username: &str) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(username.to_owned())
        }
        other => StoreError::Database(other),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, email, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"#,
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, password, email)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| insert_error(e, &user.username))?;
        Ok(id)
    }

    async fn ping(&self) -> Result<i32, StoreError> {
        let solution = sqlx::query_scalar::<_, i32>("SELECT 1 + 1 AS solution")
            .fetch_one(&self.db)
            .await?;
        Ok(solution)
    }
}
