//! PostgreSQL pool and schema for loan requests and staff accounts

use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migrate(#[from] MigrateError),
}

pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(DbError::Connect)
}

/// Bring the `users` and `loan_requests` schema up to date
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let known = MIGRATOR.iter().count();
    tracing::info!(known, "Applying database migrations");

    MIGRATOR.run(pool).await?;

    tracing::info!("Database schema is up to date");
    Ok(())
}

/// `SELECT 1` round trip used by `GET /health`
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
