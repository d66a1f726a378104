//! Database pool construction and schema migration.

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::{path::Path, time::Duration};

/// Schema, embedded so the binary and the tests share one source of truth.
pub const MIGRATION_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Connect a pool with a bounded acquire timeout.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    // Create the parent directory for file-backed databases.
    let db_path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("created missing directory {:?}", parent);
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the embedded schema statement by statement. Idempotent.
pub async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    let statements = MIGRATION_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("running {} migration statements", statements.len());

    for stmt in statements {
        tracing::debug!("executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    apply_migrations(&pool).await.expect("migrations");
    pool
}
