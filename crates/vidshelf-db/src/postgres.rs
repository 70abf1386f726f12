//! Postgres connector
//!
//! The cached "connection" is a `PgPool`: cheap to clone, and the pool options
//! bound how long an attempt may take.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::PathBuf;
use std::time::Duration;
use vidshelf_core::Config;

use crate::connection::{ConnectionError, Connector};

const IDLE_TIMEOUT_SECS: u64 = 600;
const MAX_LIFETIME_SECS: u64 = 1800;

/// Builds the Postgres pool and applies pending migrations
#[derive(Clone)]
pub struct PgConnector {
    database_url: String,
    max_connections: u32,
    acquire_timeout: Duration,
    migrations_dir: Option<PathBuf>,
}

impl PgConnector {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 20,
            acquire_timeout: Duration::from_secs(30),
            migrations_dir: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let connector = Self::new(config.database_url())
            .with_max_connections(config.db_max_connections())
            .with_acquire_timeout(Duration::from_secs(config.db_timeout_seconds()));
        if config.database.run_migrations {
            connector.with_migrations(default_migrations_dir())
        } else {
            connector
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_migrations(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = Some(dir.into());
        self
    }
}

/// Workspace `migrations/` directory, resolved from this crate's manifest
pub fn default_migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgPool;

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", max_connections = self.max_connections))]
    async fn connect(&self) -> Result<PgPool, ConnectionError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
            .max_lifetime(Duration::from_secs(MAX_LIFETIME_SECS))
            .connect(&self.database_url)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        if let Some(dir) = &self.migrations_dir {
            let migrator = sqlx::migrate::Migrator::new(dir.as_path())
                .await
                .map_err(|e| ConnectionError::Setup(format!("failed to load migrations: {}", e)))?;
            migrator
                .run(&pool)
                .await
                .map_err(|e| ConnectionError::Setup(format!("failed to run migrations: {}", e)))?;
            tracing::info!("Database migrations applied");
        }

        Ok(pool)
    }
}
