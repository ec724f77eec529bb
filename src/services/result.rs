//! Two-variant service outcome.
//!
//! Services never panic or leak storage errors to callers: every operation
//! returns `Ok(data)` or a [`ServiceError`] carrying a code from that
//! service's closed [`ErrorCode`] set. The HTTP layer maps codes to statuses
//! with [`ErrorCode::status`].

use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;

/// Closed set of failure codes for one service.
pub trait ErrorCode: Copy + fmt::Debug + Send + Sync + 'static {
    /// Wire name, e.g. `INVALID_INPUT`.
    fn as_str(&self) -> &'static str;

    /// HTTP status used when this code reaches a route handler.
    fn status(&self) -> StatusCode;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError<C> {
    pub code: C,
    pub message: String,
}

impl<C: ErrorCode> ServiceError<C> {
    pub fn new(code: C, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl<C: ErrorCode> fmt::Display for ServiceError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl<C: ErrorCode> std::error::Error for ServiceError<C> {}

impl<C: ErrorCode> Serialize for ServiceError<C> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ServiceError", 2)?;
        state.serialize_field("code", self.code.as_str())?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

pub type ServiceResult<T, C> = Result<T, ServiceError<C>>;
