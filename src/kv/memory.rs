use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{expires_at, now_secs, KeyInfo, KvNamespace, KvStoreError, ListPage, ListRequest};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local namespace. Expired entries are hidden on read and swept on
/// write.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvNamespace for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        let now = now_secs();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<u64>) -> Result<(), KvStoreError> {
        let now = now_secs();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: expires_at(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, request: ListRequest) -> Result<ListPage, KvStoreError> {
        let now = now_secs();
        let prefix = request.prefix.as_deref().unwrap_or("");

        let start = match request.cursor.as_deref() {
            Some(cursor) if cursor >= prefix => Bound::Excluded(cursor.to_string()),
            _ => Bound::Included(prefix.to_string()),
        };

        let entries = self.entries.read().await;
        let keys = entries
            .range((start, Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, e)| e.is_live(now))
            .take(request.limit.saturating_add(1))
            .map(|(name, e)| KeyInfo {
                name: name.clone(),
                expiration: e.expires_at,
            })
            .collect();

        Ok(ListPage::from_overfetch(keys, request.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prefix: Option<&str>, limit: usize, cursor: Option<&str>) -> ListRequest {
        ListRequest {
            prefix: prefix.map(str::to_string),
            limit,
            cursor: cursor.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn put_get_delete() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("k").await.unwrap(), None);

        kv.put("k", "v1".into(), None).await.unwrap();
        kv.put("k", "v2".into(), Some(60)).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v2"));

        kv.delete("k").await.unwrap();
        kv.delete("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let kv = MemoryKv::new();
        kv.entries.write().await.insert(
            "old".into(),
            Entry {
                value: "stale".into(),
                expires_at: Some(now_secs() - 1),
            },
        );
        assert_eq!(kv.get("old").await.unwrap(), None);
        let page = kv.list(request(None, 10, None)).await.unwrap();
        assert!(page.keys.is_empty());

        kv.put("fresh", "x".into(), None).await.unwrap();
        assert!(!kv.entries.read().await.contains_key("old"));
    }

    #[tokio::test]
    async fn list_pages_through_prefix() {
        let kv = MemoryKv::new();
        for key in ["a/1", "a/2", "a/3", "b/1", "0"] {
            kv.put(key, "v".into(), None).await.unwrap();
        }

        let first = kv.list(request(Some("a/"), 2, None)).await.unwrap();
        let names: Vec<_> = first.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["a/1", "a/2"]);
        assert!(!first.list_complete);

        let second = kv
            .list(request(Some("a/"), 2, first.cursor.as_deref()))
            .await
            .unwrap();
        let names: Vec<_> = second.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["a/3"]);
        assert!(second.list_complete);
        assert_eq!(second.cursor, None);
    }

    #[tokio::test]
    async fn list_reports_expiration() {
        let kv = MemoryKv::new();
        kv.put("ttl", "v".into(), Some(120)).await.unwrap();
        let page = kv.list(request(None, 10, None)).await.unwrap();
        let expiration = page.keys[0].expiration.expect("expiration set");
        assert!(expiration > now_secs());
    }
}
