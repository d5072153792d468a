use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Which `UserStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Either a full `DATABASE_URL` or the individual `DB_*` parts.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl DatabaseConfig {
    /// Parts go through `PgConnectOptions` so credentials need no escaping.
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).context("parse DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub database: DatabaseConfig,
    pub cors_origin: Option<String>,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("USER_STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => anyhow::bail!("unknown USER_STORE '{other}' (expected postgres or memory)"),
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: lookup("DB_PORT")
                .map(|v| v.parse::<u16>().context("parse DB_PORT"))
                .transpose()?
                .unwrap_or(5432),
            user: lookup("DB_USER").unwrap_or_else(|| "postgres".into()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: lookup("DB_NAME").unwrap_or_else(|| "school_db".into()),
        };

        let port = lookup("APP_PORT")
            .or_else(|| lookup("PORT"))
            .map(|v| v.parse::<u16>().context("parse APP_PORT/PORT"))
            .transpose()?
            .unwrap_or(5000);

        let defaults = BootstrapConfig::default();
        let bootstrap = BootstrapConfig {
            max_attempts: lookup("BOOTSTRAP_MAX_ATTEMPTS")
                .map(|v| v.parse::<u32>().context("parse BOOTSTRAP_MAX_ATTEMPTS"))
                .transpose()?
                .unwrap_or(defaults.max_attempts),
            retry_delay: lookup("BOOTSTRAP_RETRY_DELAY_SECS")
                .map(|v| v.parse::<u64>().context("parse BOOTSTRAP_RETRY_DELAY_SECS"))
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
        };
        anyhow::ensure!(
            bootstrap.max_attempts > 0,
            "BOOTSTRAP_MAX_ATTEMPTS must be at least 1"
        );

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            store,
            database,
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.is_empty()),
            bootstrap,
        })
    }
}
