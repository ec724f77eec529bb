// handlers/protected/profile.rs - GET /api/auth/profile handler

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::auth::AuthContext;

/// Echo the identity decoded from the caller's token.
pub async fn profile_get(Extension(auth): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "message": "Profile retrieved successfully",
        "user": auth.user,
    }))
}
