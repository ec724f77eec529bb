//! Declarative field validation for JSON request input.
//!
//! A [`Rule`] lists the constraints for one field. [`validate_field`] checks
//! them in a fixed order and stops at the first failure:
//! required → (absent optional fields stop here) → type → length → numeric
//! bounds → pattern → custom predicate.
//!
//! [`validate_object`] runs a schema of `(field, rule)` pairs in order and is
//! fail-fast: the first violation is returned, not an aggregate.

pub mod rules;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single field failed its rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// JSON shape a field is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    fn of(value: &Value) -> Option<FieldType> {
        match value {
            Value::String(_) => Some(FieldType::String),
            Value::Number(_) => Some(FieldType::Number),
            Value::Bool(_) => Some(FieldType::Boolean),
            Value::Object(_) => Some(FieldType::Object),
            Value::Array(_) => Some(FieldType::Array),
            Value::Null => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a custom predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Fails with the generic "`{field}` validation failed" message.
    Fail,
    /// Fails with this message verbatim.
    Reject(String),
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

pub type CustomCheck = Arc<dyn Fn(&Value) -> Verdict + Send + Sync>;

/// String shape check applied after the length bounds.
#[derive(Clone, Copy)]
pub struct Pattern {
    matcher: fn(&str) -> bool,
}

impl Pattern {
    pub fn new(matcher: fn(&str) -> bool) -> Self {
        Self { matcher }
    }

    pub fn matches(&self, input: &str) -> bool {
        (self.matcher)(input)
    }
}

/// Constraints for one field. Build with the chained setters:
///
/// ```
/// use edge_api::validation::{FieldType, Rule};
///
/// let rule = Rule::new().required().of_type(FieldType::String).max_length(255);
/// assert!(rule.is_required());
/// ```
#[derive(Clone, Default)]
pub struct Rule {
    required: bool,
    field_type: Option<FieldType>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Pattern>,
    custom: Option<CustomCheck>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Verdict + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("required", &self.required)
            .field("field_type", &self.field_type)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("pattern", &self.pattern.is_some())
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Ordered list of `(field, rule)` pairs checked by [`validate_object`].
pub type Schema = Vec<(&'static str, Rule)>;

/// Check one value against its rule. `None` means the field was not sent.
pub fn validate_field(value: Option<&Value>, field: &str, rule: &Rule) -> Result<(), ValidationError> {
    let blank = match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if rule.required && blank {
        return Err(ValidationError::new(field, format!("{} is required", field)));
    }

    // Absent optional fields skip every other check; an empty string does not.
    let value = match value {
        None | Some(Value::Null) => return Ok(()),
        Some(v) => v,
    };

    if let Some(expected) = rule.field_type {
        if FieldType::of(value) != Some(expected) {
            return Err(ValidationError::new(
                field,
                format!("{} must be of type {}", field, expected),
            ));
        }
    }

    if let Value::String(s) = value {
        let len = s.chars().count();
        if let Some(min) = rule.min_length {
            if len < min {
                return Err(ValidationError::new(
                    field,
                    format!("{} must be at least {} characters long", field, min),
                ));
            }
        }
        if let Some(max) = rule.max_length {
            if len > max {
                return Err(ValidationError::new(
                    field,
                    format!("{} must be no more than {} characters long", field, max),
                ));
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = rule.min {
            if n < min {
                return Err(ValidationError::new(field, format!("{} must be at least {}", field, min)));
            }
        }
        if let Some(max) = rule.max {
            if n > max {
                return Err(ValidationError::new(field, format!("{} must be no more than {}", field, max)));
            }
        }
    }

    if let (Some(pattern), Value::String(s)) = (&rule.pattern, value) {
        if !pattern.matches(s) {
            return Err(ValidationError::new(field, format!("{} format is invalid", field)));
        }
    }

    if let Some(check) = &rule.custom {
        match check(value) {
            Verdict::Pass => {}
            Verdict::Fail => {
                return Err(ValidationError::new(field, format!("{} validation failed", field)));
            }
            Verdict::Reject(message) => return Err(ValidationError::new(field, message)),
        }
    }

    Ok(())
}

/// Apply each rule of `schema` in order, failing on the first violation.
pub fn validate_object(object: &Map<String, Value>, schema: &[(&str, Rule)]) -> Result<(), ValidationError> {
    for (field, rule) in schema {
        validate_field(object.get(*field), field, rule)?;
    }
    Ok(())
}

/// HTML-escape `< > " ' &` and trim the edges.
pub fn sanitize_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}
