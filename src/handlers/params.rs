// handlers/params.rs - request parameter coercion shared by handlers

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::ApiError;

/// Turn query parameters into a JSON object the validation schemas can read.
/// Names listed in `numeric` become numbers when they parse as one; anything
/// else stays a string so the type rule can report it.
pub fn query_object(params: HashMap<String, String>, numeric: &[&str]) -> Map<String, Value> {
    params
        .into_iter()
        .map(|(name, raw)| {
            let value = if numeric.contains(&name.as_str()) {
                parse_number(&raw).unwrap_or(Value::String(raw))
            } else {
                Value::String(raw)
            };
            (name, value)
        })
        .collect()
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Value::from(n));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Path id as a positive integer.
pub fn positive_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request("ID must be a positive integer")),
    }
}
