//! One-time store initialization: schema plus the default admin account,
//! retried under a fixed-delay policy.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::accounts::StoreError;
use crate::config::BootstrapConfig;
use crate::state::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const ADMIN_EMAIL: &str = "admin@school.com";

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&BootstrapConfig> for RetryPolicy {
    fn from(cfg: &BootstrapConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            delay: cfg.retry_delay,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or `max_attempts` is reached. `op` receives
    /// the 1-based attempt number.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        "attempt failed; retrying in {:?}",
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// A single initialization attempt. A failed admin seed is logged, not fatal.
pub async fn init_store(state: &AppState, attempt: u32) -> Result<(), StoreError> {
    info!(attempt, "initializing database");
    state.store.migrate().await?;
    info!("users table created/verified");

    match state
        .accounts
        .ensure_account(ADMIN_USERNAME, ADMIN_PASSWORD, Some(ADMIN_EMAIL))
        .await
    {
        Ok(true) => info!("default admin user created"),
        Ok(false) => info!("admin user already exists"),
        Err(e) => warn!(error = %e, "admin user may already exist"),
    }
    Ok(())
}

/// Run bootstrap to completion. Returns whether the store was initialized.
pub async fn run(state: AppState) -> bool {
    let policy = RetryPolicy::from(&state.config.bootstrap);
    let state_ref = &state;
    match policy.run(move |attempt| init_store(state_ref, attempt)).await {
        Ok(()) => {
            info!("database initialized successfully");
            true
        }
        Err(e) => {
            error!(
                error = %e,
                attempts = policy.max_attempts,
                "failed to initialize database after retries"
            );
            false
        }
    }
}
