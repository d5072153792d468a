use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised by a `UserStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("duplicate entry '{0}' for key 'users.username'")]
    UniqueViolation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Database error code (SQLSTATE), when the failure carries one.
    pub fn code(&self) -> Option<String> {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => {
                db.code().map(|c| c.into_owned())
            }
            StoreError::UniqueViolation(_) => Some(UNIQUE_VIOLATION.to_string()),
            _ => None,
        }
    }
}

/// Postgres SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Outcome failures of the account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) | AccountError::DuplicateUsername => {
                StatusCode::BAD_REQUEST
            }
            AccountError::Unauthorized => StatusCode::UNAUTHORIZED,
            AccountError::Store(_) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> Option<String> {
        match self {
            AccountError::Store(e) => e.code(),
            _ => None,
        }
    }

    /// Client-facing message; server-side failures are prefixed with the
    /// operation's `server_prefix` ("Server error", "Registration failed").
    pub fn public_message(&self, server_prefix: &str) -> String {
        if self.status().is_server_error() {
            format!("{server_prefix}: {self}")
        } else {
            self.to_string()
        }
    }
}
