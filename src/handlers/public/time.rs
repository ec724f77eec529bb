// handlers/public/time.rs - GET /api/time handler

use axum::{http::header, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Current server time as an RFC 3339 / ISO 8601 UTC string.
pub async fn time_get() -> impl IntoResponse {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({ "time": now })),
    )
}
