use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

/// Errors from pool construction and health checks.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// In-memory SQLite databases live and die with their connection.
pub fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a pool for `url`. In-memory URLs get a single connection that is
/// never recycled, otherwise each pooled connection would see its own
/// empty database.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, DatabaseError> {
    if !url.starts_with("sqlite:") {
        return Err(DatabaseError::InvalidDatabaseUrl(url.to_string()));
    }
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|_| DatabaseError::InvalidDatabaseUrl(url.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = if is_memory_url(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?
    };

    info!("Created database pool for: {}", url);
    Ok(pool)
}

/// Round-trips a trivial query to prove the pool is usable.
pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
