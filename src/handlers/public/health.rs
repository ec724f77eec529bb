// handlers/public/health.rs - GET /healthz handler

use axum::{http::header, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Never cached.
pub async fn healthz_get() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({ "status": "ok" })),
    )
}
