// HTTP API Error Types
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::services::result::{ErrorCode, ServiceError};
use crate::validation::ValidationError;

const INTERNAL_MESSAGE: &str = "An error occurred while processing your request";

/// Every failure a handler can return. Converted to a response exactly once,
/// in [`IntoResponse`].
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(ValidationError),
    InvalidJson(String),
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(AuthError),

    // 404 Not Found
    NotFound(String),

    // 400/404/409 from a service error code
    Service {
        status: StatusCode,
        code: &'static str,
        message: String,
    },

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidJson(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Service { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation(err) => json!({
                "error": "validation_error",
                "message": err.message,
                "field": err.field,
            }),
            ApiError::InvalidJson(message) => json!({
                "error": "invalid_json",
                "message": message,
            }),
            ApiError::BadRequest(message) | ApiError::NotFound(message) => json!({
                "error": message,
            }),
            ApiError::Unauthorized(err) => json!({
                "error": err.code(),
                "message": err.to_string(),
            }),
            ApiError::Service { code, message, .. } => json!({
                "error": message,
                "code": code,
            }),
            ApiError::Internal(message) => json!({
                "error": "internal_error",
                "message": message,
            }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl<C: ErrorCode> From<ServiceError<C>> for ApiError {
    fn from(err: ServiceError<C>) -> Self {
        let status = err.status();
        if status.is_server_error() {
            // Log the real error but return generic message
            tracing::error!("Service error: {}", err);
            return ApiError::internal(INTERNAL_MESSAGE);
        }
        ApiError::Service {
            status,
            code: err.code.as_str(),
            message: err.message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidJson("Invalid JSON body".to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status_code(), self.to_json())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// `Json` extractor whose rejections are reported as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
