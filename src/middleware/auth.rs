use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, AuthError};
use crate::error::ApiError;

/// Bearer token middleware for protected routes. On success the decoded
/// [`AuthContext`](crate::auth::AuthContext) is inserted into request
/// extensions; any failure ends the request with 401.
pub async fn jwt_auth_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthError::InvalidAuthorizationFormat)?,
        ),
    };

    let context = auth::authenticate(header, auth::now_secs()).map_err(|err| {
        tracing::debug!("Rejected request to {}: {}", request.uri().path(), err.code());
        err
    })?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
