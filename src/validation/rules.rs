// Field rules shared by the KV and item handlers.

use serde_json::Value;

use super::{FieldType, Pattern, Rule, Schema, Verdict};

/// Longest key the KV namespace accepts.
pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
/// 365 days.
pub const MAX_TTL_SECONDS: u64 = 31_536_000;
pub const MAX_ITEMS_PAGE: i64 = 100;
pub const MAX_KV_LIST_LIMIT: i64 = 1000;

fn key_charset(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

fn whole_number(field: &'static str) -> impl Fn(&Value) -> Verdict + Send + Sync + 'static {
    move |value| match value.as_f64() {
        Some(n) if n.fract() == 0.0 => Verdict::Pass,
        _ => Verdict::Reject(format!("{} must be an integer", field)),
    }
}

fn no_surrounding_whitespace(value: &Value) -> Verdict {
    match value.as_str() {
        Some(s) if s.trim() != s => {
            Verdict::Reject("Name cannot have leading or trailing whitespace".to_string())
        }
        _ => Verdict::Pass,
    }
}

/// `[a-zA-Z0-9._-/]`, 1..=512 chars, no leading, trailing or doubled slash.
pub fn kv_key() -> Rule {
    Rule::new()
        .required()
        .of_type(FieldType::String)
        .min_length(1)
        .max_length(MAX_KEY_LENGTH)
        .pattern(Pattern::new(key_charset))
        .custom(|value| {
            let key = value.as_str().unwrap_or_default();
            if key.contains("//") {
                Verdict::Reject("Key cannot contain consecutive slashes".to_string())
            } else if key.starts_with('/') || key.ends_with('/') {
                Verdict::Reject("Key cannot start or end with slash".to_string())
            } else {
                Verdict::Pass
            }
        })
}

pub fn ttl() -> Rule {
    Rule::new()
        .of_type(FieldType::Number)
        .min(1.0)
        .max(MAX_TTL_SECONDS as f64)
        .custom(whole_number("ttl"))
}

pub fn item_name() -> Rule {
    Rule::new()
        .required()
        .of_type(FieldType::String)
        .min_length(1)
        .max_length(MAX_NAME_LENGTH)
        .custom(no_surrounding_whitespace)
}

/// Same as [`item_name`] but the field may be left out of a patch.
pub fn item_name_optional() -> Rule {
    Rule::new()
        .of_type(FieldType::String)
        .min_length(1)
        .max_length(MAX_NAME_LENGTH)
        .custom(no_surrounding_whitespace)
}

pub fn item_description() -> Rule {
    Rule::new()
        .of_type(FieldType::String)
        .max_length(MAX_DESCRIPTION_LENGTH)
}

pub fn create_item() -> Schema {
    vec![("name", item_name()), ("description", item_description())]
}

pub fn update_item() -> Schema {
    vec![("name", item_name_optional()), ("description", item_description())]
}

/// Query parameters of `GET /api/d1/items`.
pub fn pagination() -> Schema {
    vec![
        (
            "limit",
            Rule::new()
                .of_type(FieldType::Number)
                .min(1.0)
                .max(MAX_ITEMS_PAGE as f64)
                .custom(whole_number("limit")),
        ),
        (
            "offset",
            Rule::new()
                .of_type(FieldType::Number)
                .min(0.0)
                .custom(whole_number("offset")),
        ),
        (
            "cursor",
            Rule::new()
                .of_type(FieldType::Number)
                .min(0.0)
                .custom(whole_number("cursor")),
        ),
    ]
}

/// Query parameters of `GET /api/kv`.
pub fn kv_list() -> Schema {
    vec![
        (
            "prefix",
            Rule::new().of_type(FieldType::String).max_length(MAX_KEY_LENGTH),
        ),
        (
            "limit",
            Rule::new()
                .of_type(FieldType::Number)
                .min(1.0)
                .max(MAX_KV_LIST_LIMIT as f64)
                .custom(whole_number("limit")),
        ),
        ("cursor", Rule::new().of_type(FieldType::String)),
    ]
}
