//! Request payload parsing.
//!
//! Request bodies are parsed leniently: a missing, malformed, or non-object
//! body is treated as an empty object, and absent fields fall back to
//! defaults. Losing a student's log line because their client sent a
//! number where we expected a string is worse than storing it as text.

use serde_json::{Map, Value};

use crate::ProtocolError;

/// Default contest name when the admin doesn't supply one.
pub const DEFAULT_CONTEST_NAME: &str = "Contest";

/// Default `student_id` for log entries from clients that don't identify
/// themselves.
pub const UNKNOWN_STUDENT: &str = "unknown";

/// Parses a raw request body into a JSON object.
///
/// Never fails: anything that isn't a JSON object (including an empty
/// body or invalid UTF-8) becomes `{}`.
pub fn parse_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

/// Reads a free-text field from a body object.
///
/// Strings are returned as-is, `null`/missing is `None`, and any other
/// JSON value is rendered to its JSON text.
pub fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Validates the `allowed_ips` field of a policy push.
///
/// - missing field → empty list (the admin cleared the policy)
/// - JSON array of strings → that list, order preserved
/// - anything else → [`ProtocolError::InvalidIpList`]
pub fn parse_ip_list(raw: Option<&Value>) -> Result<Vec<String>, ProtocolError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let Value::Array(items) = raw else {
        return Err(ProtocolError::InvalidIpList);
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ProtocolError::InvalidIpList),
        })
        .collect()
}

/// Body of `POST /session/create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    pub contest_name: String,
}

impl CreateSessionRequest {
    pub fn from_body(body: &Value) -> Self {
        Self {
            contest_name: text_field(body, "contest_name")
                .unwrap_or_else(|| DEFAULT_CONTEST_NAME.to_string()),
        }
    }
}

impl Default for CreateSessionRequest {
    fn default() -> Self {
        Self {
            contest_name: DEFAULT_CONTEST_NAME.to_string(),
        }
    }
}

/// Body of `POST /session/{id}/log`, with defaults already applied.
///
/// The timestamp isn't part of the submission: the server stamps entries
/// itself so a student's clock can't reorder the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSubmission {
    pub student_id: String,
    pub hostname: String,
    pub event: String,
    pub detail: String,
}

impl LogSubmission {
    pub fn from_body(body: &Value) -> Self {
        Self {
            student_id: text_field(body, "student_id")
                .unwrap_or_else(|| UNKNOWN_STUDENT.to_string()),
            hostname: text_field(body, "hostname").unwrap_or_default(),
            event: text_field(body, "event").unwrap_or_default(),
            detail: text_field(body, "detail").unwrap_or_default(),
        }
    }

    /// Shorthand used by callers that already have typed values.
    pub fn new(student_id: &str, hostname: &str, event: &str, detail: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            hostname: hostname.to_string(),
            event: event.to_string(),
            detail: detail.to_string(),
        }
    }
}

impl Default for LogSubmission {
    fn default() -> Self {
        Self::from_body(&Value::Object(Map::new()))
    }
}
