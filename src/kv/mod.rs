//! Key-value namespace binding.
//!
//! [`KvNamespace`] is the raw storage surface the KV service wraps: opaque
//! text values, optional TTL, lexicographic listing with prefix and cursor.
//! Two backends ship with the crate, selected by `KV_BACKEND`.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

#[derive(Debug, Error)]
pub enum KvStoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("{0}")]
    Backend(String),
}

/// One listed key. `expiration` is epoch seconds when a TTL was set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: Option<String>,
    pub limit: usize,
    /// Opaque continuation token from a previous page.
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<KeyInfo>,
    pub cursor: Option<String>,
    pub list_complete: bool,
}

impl ListPage {
    /// Build a page from up to `limit + 1` fetched keys.
    pub(crate) fn from_overfetch(mut keys: Vec<KeyInfo>, limit: usize) -> Self {
        let list_complete = keys.len() <= limit;
        keys.truncate(limit);
        let cursor = if list_complete {
            None
        } else {
            keys.last().map(|k| k.name.clone())
        };
        Self {
            keys,
            cursor,
            list_complete,
        }
    }
}

#[async_trait]
pub trait KvNamespace: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError>;

    /// Insert or overwrite. `ttl` is in seconds.
    async fn put(&self, key: &str, value: String, ttl: Option<u64>) -> Result<(), KvStoreError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvStoreError>;

    async fn list(&self, request: ListRequest) -> Result<ListPage, KvStoreError>;
}

pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn expires_at(ttl: Option<u64>) -> Option<i64> {
    ttl.map(|secs| now_secs().saturating_add(i64::try_from(secs).unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<KeyInfo> {
        names
            .iter()
            .map(|n| KeyInfo {
                name: n.to_string(),
                expiration: None,
            })
            .collect()
    }

    #[test]
    fn overfetch_marks_incomplete_and_sets_cursor() {
        let page = ListPage::from_overfetch(keys(&["a", "b", "c"]), 2);
        assert!(!page.list_complete);
        assert_eq!(page.keys.len(), 2);
        assert_eq!(page.cursor.as_deref(), Some("b"));

        let page = ListPage::from_overfetch(keys(&["a", "b"]), 2);
        assert!(page.list_complete);
        assert_eq!(page.cursor, None);
    }
}
