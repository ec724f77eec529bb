use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use crate::database::models::{Item, ItemPatch};
use crate::database::schema::ITEMS_SCHEMA_SQL;

/// Failure reported by an [`ItemRepository`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    /// True when the database rejected the write because of a table
    /// constraint rather than an operational problem.
    pub fn is_constraint_violation(&self) -> bool {
        if let StoreError::Sqlx(sqlx::Error::Database(db)) = self {
            if matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ) {
                return true;
            }
        }
        let message = self.to_string();
        message.contains("UNIQUE") || message.contains("constraint")
    }
}

/// Window over `items` ordered by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Only rows with `id > after`.
    pub after: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn apply_schema(&self) -> Result<(), StoreError>;

    /// Insert and return the stored row, `None` if the backend returned nothing.
    async fn insert(&self, name: &str, description: Option<&str>) -> Result<Option<Item>, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Item>, StoreError>;

    async fn page(&self, query: PageQuery) -> Result<Vec<Item>, StoreError>;

    /// Row count honouring `after` but not limit or offset.
    async fn count(&self, after: Option<i64>) -> Result<i64, StoreError>;

    /// Write the present fields of `patch` and refresh `updated_at`.
    async fn update(&self, id: i64, patch: &ItemPatch) -> Result<Option<Item>, StoreError>;

    /// Returns the number of removed rows.
    async fn delete(&self, id: i64) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteItemRepository {
    pool: SqlitePool,
}

impl SqliteItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for SqliteItemRepository {
    async fn apply_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(ITEMS_SCHEMA_SQL).await?;
        Ok(())
    }

    async fn insert(&self, name: &str, description: Option<&str>) -> Result<Option<Item>, StoreError> {
        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (name, description) VALUES (?, ?) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn page(&self, query: PageQuery) -> Result<Vec<Item>, StoreError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM items");
        if let Some(after) = query.after {
            sql.push(" WHERE id > ").push_bind(after);
        }
        sql.push(" ORDER BY id ASC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let items = sql.build_query_as::<Item>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    async fn count(&self, after: Option<i64>) -> Result<i64, StoreError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM items");
        if let Some(after) = after {
            sql.push(" WHERE id > ").push_bind(after);
        }
        let total: i64 = sql.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn update(&self, id: i64, patch: &ItemPatch) -> Result<Option<Item>, StoreError> {
        let mut sql: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE items SET ");
        {
            let mut set = sql.separated(", ");
            if let Some(name) = &patch.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(description) = &patch.description {
                set.push("description = ").push_bind_unseparated(description.clone());
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        sql.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let item = sql.build_query_as::<Item>().fetch_optional(&self.pool).await?;
        Ok(item)
    }

    async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
