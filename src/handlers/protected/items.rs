// handlers/protected/items.rs - /api/d1 handlers
//
// GET    /api/d1/init        create the items schema
// GET    /api/d1/items       list (limit, offset, cursor)
// POST   /api/d1/items       create
// GET    /api/d1/items/:id   read
// PUT    /api/d1/items/:id   partial update
// DELETE /api/d1/items/:id   remove

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::database::{Item, ItemPatch, NewItem};
use crate::error::{ApiError, JsonBody};
use crate::handlers::{positive_id, query_object};
use crate::services::item_service::{ItemPage, ListItemsOptions};
use crate::validation::{rules, sanitize_string, validate_field, validate_object, ValidationError};

fn body_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(object) => Ok(object),
        _ => Err(ValidationError::new("body", "body must be of type object").into()),
    }
}

/// Escape a name that already passed the schema. The length bound is
/// checked again on the escaped text since that is what gets stored.
fn stored_name(raw: &str) -> Result<String, ApiError> {
    let name = sanitize_string(raw);
    validate_field(Some(&Value::String(name.clone())), "name", &rules::item_name())?;
    Ok(name)
}

/// Empty descriptions are stored as NULL.
fn description_of(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

pub async fn schema_init(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.items.initialize_schema().await?;
    Ok(Json(json!({ "message": "Schema initialized successfully" })))
}

/**
 * POST /api/d1/items - Create an item
 *
 * ```json
 * { "name": "string", "description": "string | null" }
 * ```
 */
pub async fn item_create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body_object(body)?;
    validate_object(&body, &rules::create_item())?;

    let input = NewItem {
        name: stored_name(body.get("name").and_then(Value::as_str).unwrap_or_default())?,
        description: body.get("description").and_then(description_of),
    };

    let item = state.items.create_item(&input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn item_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id = positive_id(&id)?;
    state
        .items
        .get_item(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

/// Paginated listing, ascending by id.
pub async fn items_list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ItemPage>, ApiError> {
    let query = query_object(params, &["limit", "offset", "cursor"]);
    validate_object(&query, &rules::pagination())?;

    let number = |name: &str| query.get(name).and_then(Value::as_f64).map(|n| n as i64);
    let options = ListItemsOptions {
        limit: number("limit"),
        offset: number("offset"),
        cursor: number("cursor"),
    };

    let page = state.items.list_items(options).await?;
    Ok(Json(page))
}

/// Only the fields present in the body are written. An explicit
/// `"description": null` clears the description.
pub async fn item_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Item>, ApiError> {
    let id = positive_id(&id)?;
    let body = body_object(body)?;
    validate_object(&body, &rules::update_item())?;

    let patch = ItemPatch {
        name: body
            .get("name")
            .and_then(Value::as_str)
            .map(stored_name)
            .transpose()?,
        description: body.get("description").map(description_of),
    };

    state
        .items
        .update_item(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

pub async fn item_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = positive_id(&id)?;
    if !state.items.delete_item(id).await? {
        return Err(ApiError::not_found("Item not found"));
    }
    Ok(Json(json!({ "id": id, "deleted": true })))
}
