use async_trait::async_trait;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use super::{expires_at, now_secs, KeyInfo, KvNamespace, KvStoreError, ListPage, ListRequest};
use crate::database::schema::KV_SCHEMA_SQL;

/// Namespace persisted in the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), KvStoreError> {
        self.pool.execute(KV_SCHEMA_SQL).await?;
        Ok(())
    }
}

#[async_trait]
impl KvNamespace for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM kv_entries WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now_secs())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<u64>) -> Result<(), KvStoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now_secs())
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO kv_entries (key, value, expires_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at(ttl))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvStoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, request: ListRequest) -> Result<ListPage, KvStoreError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT key, expires_at FROM kv_entries WHERE (expires_at IS NULL OR expires_at > ",
        );
        query.push_bind(now_secs()).push(")");

        if let Some(prefix) = request.prefix.as_deref().filter(|p| !p.is_empty()) {
            query
                .push(" AND substr(key, 1, length(")
                .push_bind(prefix.to_string())
                .push(")) = ")
                .push_bind(prefix.to_string());
        }
        if let Some(cursor) = request.cursor.as_deref() {
            query.push(" AND key > ").push_bind(cursor.to_string());
        }

        let fetch = i64::try_from(request.limit.saturating_add(1)).unwrap_or(i64::MAX);
        query.push(" ORDER BY key ASC LIMIT ").push_bind(fetch);

        let rows: Vec<(String, Option<i64>)> = query.build_query_as().fetch_all(&self.pool).await?;
        let keys = rows
            .into_iter()
            .map(|(name, expiration)| KeyInfo { name, expiration })
            .collect();

        Ok(ListPage::from_overfetch(keys, request.limit))
    }
}
