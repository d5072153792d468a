use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::accounts::{AccountService, InMemoryUserStore, PgUserStore, UserStore};
use crate::config::{AppConfig, StoreKind};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match config.store {
            StoreKind::Postgres => {
                // Lazy so that bootstrap retries own the first connection attempts.
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect_lazy_with(config.database.connect_options()?);
                Arc::new(PgUserStore::new(db))
            }
            StoreKind::Memory => Arc::new(InMemoryUserStore::new()),
        };
        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            store,
            config,
        }
    }

    /// In-memory state with default configuration.
    pub fn fake() -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "USER_STORE" => Some("memory".into()),
            _ => None,
        })
        .expect("default config is valid");
        Self::from_parts(Arc::new(InMemoryUserStore::new()), Arc::new(config))
    }
}
