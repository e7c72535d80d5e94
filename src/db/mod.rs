pub mod migrate;
pub mod operations;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] migrate::MigrationError),
}

/// Connection handle for the transactional record store. All engine state
/// is partitioned by userId (and userId+subjectId for metrics), so a single
/// shared pool is sufficient.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(DbInitError::MissingUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&url)
            .await?;

        migrate::run(&pool).await?;

        Ok(Arc::new(Self { pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<Duration, sqlx::Error> {
        let started = std::time::Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(started.elapsed())
    }
}
