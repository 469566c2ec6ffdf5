//! Decoding of a tool's `arguments` object into its request type. Shape
//! problems (missing or unknown keys, wrong JSON types) come from serde and
//! stop at the first one; content rules come from `validator` and are all
//! reported together.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use serde_path_to_error::Segment;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    TooSmall,
    TooBig,
    UnrecognizedKeys,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new(code: IssueCode, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self { code, path, message: message.into() }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", path.join("."), self.message)
    }
}

/// One or more contract violations, displayed as `path: message; path: message`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// JSON type names as they appear in `Expected X, received Y` messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Maps serde's wording for a type (`a string`, `integer `3``, `map`,
/// `struct Foo`) onto a JSON type name.
fn serde_kind(description: &str) -> &'static str {
    let description = description.strip_prefix("a ").unwrap_or(description);
    match description.split_whitespace().next().unwrap_or_default() {
        "string" | "character" => "string",
        "boolean" => "boolean",
        "integer" | "floating" | "number" => "number",
        "null" | "unit" => "null",
        "sequence" | "tuple" => "array",
        "map" | "struct" => "object",
        other => {
            tracing::debug!(kind = other, "unmapped serde type description");
            "unknown"
        }
    }
}

fn backticked<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    message.strip_prefix(prefix)?.strip_prefix('`')?.split('`').next()
}

fn shape_issue(path: Vec<PathSegment>, message: &str) -> Issue {
    if let Some(field) = backticked(message, "missing field ") {
        let mut path = path;
        path.push(field.into());
        return Issue::new(IssueCode::InvalidType, path, "Required");
    }
    if let Some(field) = backticked(message, "unknown field ") {
        return Issue::new(
            IssueCode::UnrecognizedKeys,
            Vec::new(),
            format!("Unrecognized key(s) in object: '{field}'"),
        );
    }
    if let Some((received, expected)) = message
        .strip_prefix("invalid type: ")
        .and_then(|rest| rest.split_once(", expected "))
    {
        return Issue::new(
            IssueCode::InvalidType,
            path,
            format!("Expected {}, received {}", serde_kind(expected), serde_kind(received)),
        );
    }
    Issue::new(IssueCode::Custom, path, message)
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ValidationError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err
            .path()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Map { key } => Some(PathSegment::Key(key.clone())),
                Segment::Seq { index } => Some(PathSegment::Index(*index)),
                _ => None,
            })
            .collect();
        Self::new(vec![shape_issue(path, &err.inner().to_string())])
    }
}

/// `utility_id` -> `utilityId`, matching the serde renaming of request fields.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        match c {
            '_' => upper = true,
            c if upper => {
                out.extend(c.to_uppercase());
                upper = false;
            }
            c => out.push(c),
        }
    }
    out
}

fn length_code(error: &validator::ValidationError) -> IssueCode {
    let len = error.params.get("value").and_then(Value::as_str).map(|s| s.chars().count());
    let min = error.params.get("min").and_then(Value::as_u64);
    match (len, min) {
        (Some(len), Some(min)) if (len as u64) < min => IssueCode::TooSmall,
        _ => IssueCode::TooBig,
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut issues = Vec::new();
        for (field, field_errors) in fields {
            let key = camel_case(&field);
            for error in field_errors {
                let code = match &*error.code {
                    "length" => length_code(error),
                    _ => IssueCode::Custom,
                };
                let message = error
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| error.code.to_string());
                issues.push(Issue::new(code, vec![key.as_str().into()], message));
            }
        }
        Self::new(issues)
    }
}

/// Decodes and validates `args`. Absent or null arguments read as an empty
/// object.
pub fn parse_args<T: DeserializeOwned + Validate>(args: Option<&Value>) -> Result<T, ValidationError> {
    let value = match args {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(other) => {
            return Err(ValidationError::new(vec![Issue::new(
                IssueCode::InvalidType,
                Vec::new(),
                format!("Expected object, received {}", json_type(other)),
            )]))
        }
    };

    let request: T = serde_path_to_error::deserialize(value)?;
    request.validate()?;
    Ok(request)
}
