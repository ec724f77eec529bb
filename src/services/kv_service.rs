use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::kv::{KeyInfo, KvNamespace, KvStoreError, ListRequest};
use crate::services::result::{ErrorCode, ServiceError, ServiceResult};
use crate::validation::rules::MAX_TTL_SECONDS;

pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvErrorCode {
    KeyNotFound,
    InvalidValue,
    KvError,
}

impl ErrorCode for KvErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            KvErrorCode::KeyNotFound => "KEY_NOT_FOUND",
            KvErrorCode::InvalidValue => "INVALID_VALUE",
            KvErrorCode::KvError => "KV_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            KvErrorCode::KeyNotFound => StatusCode::NOT_FOUND,
            KvErrorCode::InvalidValue => StatusCode::BAD_REQUEST,
            KvErrorCode::KvError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type KvResult<T> = ServiceResult<T, KvErrorCode>;

impl From<KvStoreError> for ServiceError<KvErrorCode> {
    fn from(err: KvStoreError) -> Self {
        ServiceError::new(KvErrorCode::KvError, err.to_string())
    }
}

/// How a stored value is handed back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueType {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    pub value_type: ValueType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PutOptions {
    /// Seconds to live.
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyListing {
    pub keys: Vec<KeyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub complete: bool,
}

fn require_key(key: &str) -> KvResult<()> {
    if key.is_empty() {
        return Err(ServiceError::new(
            KvErrorCode::InvalidValue,
            "Key must be a non-empty string",
        ));
    }
    Ok(())
}

fn require_ttl(ttl: Option<u64>) -> KvResult<()> {
    match ttl {
        Some(secs) if secs == 0 || secs > MAX_TTL_SECONDS => Err(ServiceError::new(
            KvErrorCode::InvalidValue,
            format!("TTL must be between 1 and {} seconds", MAX_TTL_SECONDS),
        )),
        _ => Ok(()),
    }
}

/// Typed access to a [`KvNamespace`].
#[derive(Clone)]
pub struct KvService {
    kv: Arc<dyn KvNamespace>,
}

impl KvService {
    pub fn new(kv: Arc<dyn KvNamespace>) -> Self {
        Self { kv }
    }

    /// `Ok(None)` when the key does not exist. Text values come back as
    /// `Value::String`; JSON values are parsed.
    pub async fn get(&self, key: &str, options: GetOptions) -> KvResult<Option<Value>> {
        require_key(key)?;

        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };

        match options.value_type {
            ValueType::Text => Ok(Some(Value::String(raw))),
            ValueType::Json => serde_json::from_str(&raw).map(Some).map_err(|_| {
                ServiceError::new(KvErrorCode::InvalidValue, "Stored value is not valid JSON")
            }),
        }
    }

    pub async fn put(&self, key: &str, value: impl Into<String>, options: PutOptions) -> KvResult<()> {
        require_key(key)?;
        require_ttl(options.ttl)?;
        self.kv.put(key, value.into(), options.ttl).await?;
        Ok(())
    }

    /// Serialize `value` and store the text. Nothing is written when
    /// serialization fails.
    pub async fn put_json<T>(&self, key: &str, value: &T, options: PutOptions) -> KvResult<()>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(value).map_err(|_| {
            ServiceError::new(KvErrorCode::InvalidValue, "Value cannot be serialized to JSON")
        })?;
        self.put(key, text, options).await
    }

    pub async fn delete(&self, key: &str) -> KvResult<()> {
        require_key(key)?;
        self.kv.delete(key).await?;
        Ok(())
    }

    pub async fn list(&self, options: ListOptions) -> KvResult<KeyListing> {
        let limit = options.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 {
            return Err(ServiceError::new(
                KvErrorCode::InvalidValue,
                "Limit must be a positive integer",
            ));
        }

        let page = self
            .kv
            .list(ListRequest {
                prefix: options.prefix,
                limit,
                cursor: options.cursor,
            })
            .await?;

        Ok(KeyListing {
            keys: page.keys,
            cursor: page.cursor,
            complete: page.list_complete,
        })
    }
}
