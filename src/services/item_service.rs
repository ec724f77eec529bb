use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::warn;

use crate::database::{Item, ItemPatch, ItemRepository, NewItem, PageQuery, StoreError};
use crate::services::result::{ErrorCode, ServiceError, ServiceResult};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemErrorCode {
    NotFound,
    InvalidInput,
    DatabaseError,
    ConstraintError,
}

impl ErrorCode for ItemErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            ItemErrorCode::NotFound => "NOT_FOUND",
            ItemErrorCode::InvalidInput => "INVALID_INPUT",
            ItemErrorCode::DatabaseError => "DATABASE_ERROR",
            ItemErrorCode::ConstraintError => "CONSTRAINT_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ItemErrorCode::NotFound => StatusCode::NOT_FOUND,
            ItemErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ItemErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ItemErrorCode::ConstraintError => StatusCode::CONFLICT,
        }
    }
}

pub type ItemResult<T> = ServiceResult<T, ItemErrorCode>;

fn database_error(err: StoreError) -> ServiceError<ItemErrorCode> {
    ServiceError::new(ItemErrorCode::DatabaseError, err.to_string())
}

fn write_error(err: StoreError) -> ServiceError<ItemErrorCode> {
    if err.is_constraint_violation() {
        ServiceError::new(ItemErrorCode::ConstraintError, err.to_string())
    } else {
        database_error(err)
    }
}

fn invalid(message: &str) -> ServiceError<ItemErrorCode> {
    ServiceError::new(ItemErrorCode::InvalidInput, message)
}

fn check_id(id: i64) -> ItemResult<()> {
    if id <= 0 {
        return Err(invalid("ID must be a positive integer"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListItemsOptions {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Only ids strictly greater than this; `0` means no filter.
    pub cursor: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPage {
    pub items: Vec<Item>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

/// CRUD over the `items` table.
#[derive(Clone)]
pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self { repo }
    }

    /// Idempotent.
    pub async fn initialize_schema(&self) -> ItemResult<()> {
        self.repo.apply_schema().await.map_err(database_error)
    }

    pub async fn create_item(&self, input: &NewItem) -> ItemResult<Item> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(invalid("Name is required and must be a non-empty string"));
        }
        let description = input.description.as_deref().filter(|d| !d.is_empty());

        self.repo
            .insert(name, description)
            .await
            .map_err(write_error)?
            .ok_or_else(|| ServiceError::new(ItemErrorCode::DatabaseError, "Failed to create item"))
    }

    pub async fn get_item(&self, id: i64) -> ItemResult<Option<Item>> {
        check_id(id)?;
        self.repo.find(id).await.map_err(database_error)
    }

    /// One page ordered by ascending id. Page and count queries run
    /// concurrently; a failed count only drops `total`.
    pub async fn list_items(&self, options: ListItemsOptions) -> ItemResult<ItemPage> {
        let limit = options.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = options.offset.unwrap_or(0);
        let cursor = options.cursor.unwrap_or(0);

        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(invalid("Limit must be between 1 and 100"));
        }
        if offset < 0 {
            return Err(invalid("Offset must be non-negative"));
        }
        if cursor < 0 {
            return Err(invalid("Cursor must be non-negative"));
        }

        let after = (cursor > 0).then_some(cursor);
        let query = PageQuery {
            after,
            limit: limit + 1,
            offset,
        };

        let (page, count) = futures::join!(self.repo.page(query), self.repo.count(after));

        let mut items = page.map_err(database_error)?;
        let has_more = items.len() as i64 > limit;
        items.truncate(limit as usize);

        let total = match count {
            Ok(total) => Some(total),
            Err(err) => {
                warn!("Item count query failed, omitting total: {}", err);
                None
            }
        };

        Ok(ItemPage {
            items,
            has_more,
            total,
        })
    }

    /// `Ok(None)` when no row has `id`.
    pub async fn update_item(&self, id: i64, patch: &ItemPatch) -> ItemResult<Option<Item>> {
        check_id(id)?;
        if patch.is_empty() {
            return Err(invalid("At least one field must be provided for update"));
        }

        let mut patch = patch.clone();
        if let Some(name) = patch.name.as_mut() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(invalid("Name must be a non-empty string"));
            }
            *name = trimmed.to_string();
        }

        self.repo.update(id, &patch).await.map_err(write_error)
    }

    /// `Ok(false)` when there was nothing to delete.
    pub async fn delete_item(&self, id: i64) -> ItemResult<bool> {
        check_id(id)?;
        let removed = self.repo.delete(id).await.map_err(database_error)?;
        Ok(removed > 0)
    }
}
