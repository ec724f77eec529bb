//! Bearer token decoding.
//!
//! Tokens are JWT-shaped (`header.payload.signature`). Only the payload is
//! read: the header and signature segments are never verified, so any
//! issuer's token with a subject and a future `exp` is accepted.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: Vec<String>,
}

/// Per-request identity, stored in request extensions by the auth
/// middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthorization,

    #[error("Authorization header must use Bearer token format")]
    InvalidAuthorizationFormat,

    #[error("Invalid token format")]
    MalformedToken,

    #[error("Token missing subject")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "missing_authorization",
            AuthError::InvalidAuthorizationFormat => "invalid_authorization_format",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
        }
    }
}

/// Pull the token out of an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingAuthorization)?;
    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorizationFormat)
}

/// Accepts both base64 alphabets, padded or not.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}

fn decode_payload(token: &str) -> Result<Map<String, Value>, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts[1].is_empty() {
        return Err(AuthError::MalformedToken);
    }

    let bytes = decode_segment(parts[1]).ok_or(AuthError::MalformedToken)?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(payload)) => Ok(payload),
        _ => Err(AuthError::MalformedToken),
    }
}

/// Decode `token` and check its subject and expiry against `now`
/// (epoch seconds).
pub fn parse_token(token: &str, now: f64) -> Result<User, AuthError> {
    let payload = decode_payload(token)?;

    let id = match payload.get("sub") {
        Some(Value::String(sub)) if !sub.is_empty() => sub.clone(),
        _ => return Err(AuthError::InvalidToken),
    };

    match payload.get("exp").and_then(Value::as_f64) {
        Some(exp) if exp != 0.0 && exp >= now => {}
        _ => return Err(AuthError::ExpiredToken),
    }

    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);
    let roles = payload
        .get("roles")
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(User { id, email, roles })
}

/// Current time in fractional epoch seconds.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Header-to-context in one step.
pub fn authenticate(header: Option<&str>, now: f64) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header)?;
    let user = parse_token(token, now)?;
    Ok(AuthContext {
        user,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    const NOW: f64 = 1_700_000_000.0;

    fn token_with(payload: Value) -> String {
        format!("header.{}.signature", STANDARD.encode(payload.to_string()))
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token(None), Err(AuthError::MissingAuthorization));
        assert_eq!(bearer_token(Some("Basic abc")), Err(AuthError::InvalidAuthorizationFormat));
        assert_eq!(bearer_token(Some("bearer abc")), Err(AuthError::InvalidAuthorizationFormat));
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
    }

    #[test]
    fn malformed_shapes() {
        for token in ["invalid", "invalid.token", "a..c", "a.b.c.d", "a.!!!.c"] {
            assert_eq!(parse_token(token, NOW), Err(AuthError::MalformedToken), "{token}");
        }
        let not_object = format!("h.{}.s", STANDARD.encode("[1,2,3]"));
        assert_eq!(parse_token(&not_object, NOW), Err(AuthError::MalformedToken));
        let not_json = format!("h.{}.s", STANDARD.encode("hello"));
        assert_eq!(parse_token(&not_json, NOW), Err(AuthError::MalformedToken));
    }

    #[test]
    fn subject_is_required() {
        let cases = [
            json!({ "exp": NOW + 3600.0 }),
            json!({ "sub": "", "exp": NOW + 3600.0 }),
            json!({ "sub": 42, "exp": NOW + 3600.0 }),
        ];
        for payload in cases {
            assert_eq!(parse_token(&token_with(payload), NOW), Err(AuthError::InvalidToken));
        }
    }

    #[test]
    fn expiry_is_enforced() {
        let cases = [
            json!({ "sub": "u" }),
            json!({ "sub": "u", "exp": "tomorrow" }),
            json!({ "sub": "u", "exp": 0 }),
            json!({ "sub": "u", "exp": NOW - 3600.0 }),
        ];
        for payload in cases {
            assert_eq!(parse_token(&token_with(payload), NOW), Err(AuthError::ExpiredToken));
        }
    }

    #[test]
    fn valid_token_yields_user() {
        let token = token_with(json!({
            "sub": "user123",
            "email": "test@example.com",
            "roles": ["user"],
            "exp": NOW + 3600.0,
            "iat": NOW,
        }));
        let user = parse_token(&token, NOW).unwrap();
        assert_eq!(user.id, "user123");
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
        assert_eq!(user.roles, ["user"]);
    }

    #[test]
    fn roles_default_empty_and_email_omitted() {
        let token = token_with(json!({ "sub": "user123", "exp": NOW + 1.0 }));
        let user = parse_token(&token, NOW).unwrap();
        assert!(user.roles.is_empty());
        assert_eq!(serde_json::to_value(&user).unwrap(), json!({ "id": "user123", "roles": [] }));
    }

    #[test]
    fn url_safe_unpadded_payload_is_accepted() {
        // "?>" encodes to characters that differ between the alphabets
        let payload = json!({ "sub": "a?>b", "exp": NOW + 60.0 }).to_string();
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload));
        assert_eq!(parse_token(&token, NOW).unwrap().id, "a?>b");
    }

    #[test]
    fn authenticate_keeps_raw_token() {
        let token = token_with(json!({ "sub": "u", "exp": NOW + 60.0 }));
        let header = format!("Bearer {token}");
        let ctx = authenticate(Some(&header), NOW).unwrap();
        assert_eq!(ctx.token, token);
        assert_eq!(ctx.user.id, "u");
    }

    #[test]
    fn codes_and_messages() {
        assert_eq!(AuthError::ExpiredToken.code(), "expired_token");
        assert_eq!(AuthError::MissingAuthorization.to_string(), "Authorization header is required");
    }
}
