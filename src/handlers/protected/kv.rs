// handlers/protected/kv.rs - /api/kv handlers
//
// GET    /api/kv          list keys
// GET    /api/kv/*key     read one value (?type=json parses it)
// PUT    /api/kv/*key     write { value, ttl? }
// DELETE /api/kv/*key     remove

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{ApiError, JsonBody};
use crate::handlers::query_object;
use crate::services::kv_service::{GetOptions, KeyListing, ListOptions, PutOptions, ValueType};
use crate::validation::{rules, validate_field, validate_object};

fn check_key(key: &str) -> Result<(), ApiError> {
    validate_field(Some(&Value::String(key.to_string())), "key", &rules::kv_key())?;
    Ok(())
}

/// Read a value. Text by default; `?type=json` returns the parsed document.
pub async fn kv_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    check_key(&key)?;

    let value_type = match params.get("type").map(String::as_str) {
        Some("json") => ValueType::Json,
        _ => ValueType::Text,
    };

    let value = state
        .kv
        .get(&key, GetOptions { value_type })
        .await?
        .ok_or_else(|| ApiError::not_found("Key not found"))?;

    Ok(Json(json!({ "key": key, "value": value })))
}

/// Store `value`. Strings are stored verbatim, anything else as JSON text.
pub async fn kv_put(
    State(state): State<AppState>,
    Path(key): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    check_key(&key)?;

    let value = body
        .get("value")
        .ok_or_else(|| ApiError::bad_request("Body must contain 'value' field"))?;

    validate_field(body.get("ttl"), "ttl", &rules::ttl())?;
    let options = PutOptions {
        ttl: body.get("ttl").and_then(Value::as_f64).map(|secs| secs as u64),
    };

    match value {
        Value::String(text) => state.kv.put(&key, text.clone(), options).await?,
        other => state.kv.put_json(&key, other, options).await?,
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "key": key, "success": true })),
    ))
}

pub async fn kv_delete(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    check_key(&key)?;
    state.kv.delete(&key).await?;
    Ok(Json(json!({ "key": key, "deleted": true })))
}

/// List keys, optionally under `prefix`, `limit` per page, resuming at
/// `cursor`.
pub async fn kv_list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<KeyListing>, ApiError> {
    let query = query_object(params, &["limit"]);
    validate_object(&query, &rules::kv_list())?;

    let options = ListOptions {
        prefix: query.get("prefix").and_then(Value::as_str).map(str::to_string),
        limit: query
            .get("limit")
            .and_then(Value::as_f64)
            .map(|limit| limit as usize),
        cursor: query.get("cursor").and_then(Value::as_str).map(str::to_string),
    };

    let listing = state.kv.list(options).await?;
    Ok(Json(listing))
}
