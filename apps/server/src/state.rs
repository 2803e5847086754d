//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::{Config, DatabaseConfig};
use crate::db::{PackageStore, PostgresPackageStore};
use crate::services::SearchService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub search_service: Arc<SearchService>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Connect to Postgres, apply migrations when configured, and wire the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = connect_pool(&config.database).await?;

        if config.database.run_migrations {
            run_migrations(&pool).await?;
        }

        let store: Arc<dyn PackageStore> = Arc::new(PostgresPackageStore::new(pool.clone()));
        let mut state = Self::with_store(config, store);
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// State over an arbitrary store, without a database pool.
    pub fn with_store(config: Config, store: Arc<dyn PackageStore>) -> Self {
        let search_service = Arc::new(SearchService::new(store, config.search.clone()));
        Self {
            config: Arc::new(config),
            search_service,
            db_pool: None,
        }
    }
}

pub async fn connect_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let mut options: PgConnectOptions = config
        .url
        .parse()
        .context("Invalid database.url")?;
    if config.statement_timeout_seconds > 0 {
        options = options.options([(
            "statement_timeout",
            format!("{}s", config.statement_timeout_seconds),
        )]);
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_size)
        .max_connections(config.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
        .connect_with(options)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = config.pool_max_size,
        statement_timeout_seconds = config.statement_timeout_seconds,
        "Database pool ready"
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> crate::Result<()> {
    tracing::info!("Applying database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
