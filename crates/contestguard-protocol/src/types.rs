//! Core wire types for ContestGuard.
//!
//! Every type here is something that ends up in a JSON body, either sent
//! to the admin dashboard or to a student client. Field names are part of
//! the public contract: older student builds parse these responses, so
//! renaming a field is a breaking change.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short identifier of a contest session, e.g. `"A3F7B2C1"`.
///
/// This is a newtype wrapper around `String`, so a session id can't be
/// confused with a session code or admin token in a function signature
/// even though all three are strings underneath.
///
/// `#[serde(transparent)]` serialises it as the bare string, not as
/// `{ "0": "A3F7B2C1" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a session.
///
/// ```text
///   Active ──(end)──→ Ended
/// ```
///
/// There is no way back: once a session is `Ended` it stays ended for the
/// rest of the process lifetime. Student clients poll this value and unlock
/// the machine when they see `"ended"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Ended,
}

impl SessionStatus {
    /// Returns `true` while the lockdown policy is in force.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

/// One student-reported event, as stored and served back to the admin.
///
/// The timestamp is stamped by the server when the entry is appended; the
/// other fields are whatever the student client sent (with defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub student_id: String,
    pub hostname: String,
    pub event: String,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    #[serde(with = "timestamp")]
    pub time: DateTime<Utc>,
}

/// `POST /session/create`. The only body that ever carries the admin token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub session_code: String,
    pub admin_token: String,
    pub message: String,
}

/// `POST /session/{id}/ips`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsUpdatedResponse {
    pub message: String,
    pub count: usize,
    pub allowed_ips: Vec<String>,
}

/// The policy a student fetches with `GET /session/{id}/ips`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub session_id: SessionId,
    pub contest_name: String,
    pub allowed_ips: Vec<String>,
    pub status: SessionStatus,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// The lightweight poll body of `GET /session/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: SessionStatus,
    pub allowed_ips: Vec<String>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// `POST /session/{id}/end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnded {
    pub message: String,
    #[serde(with = "timestamp")]
    pub ended_at: DateTime<Utc>,
}

/// `POST /session/{id}/log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAck {
    pub message: String,
}

/// `GET /session/{id}/logs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsReport {
    pub session_id: SessionId,
    pub contest_name: String,
    pub student_count: u64,
    pub log_count: usize,
    pub logs: Vec<LogEntry>,
}

/// `GET /session/{id}/info`: the whole session record minus the admin
/// token.
///
/// There is deliberately no `admin_token` field on this type, so the
/// secret can't leak through it no matter how it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub session_code: String,
    pub contest_name: String,
    pub allowed_ips: Vec<String>,
    pub status: SessionStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::option")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Absent from the JSON until the admin pushes the first IP list.
    #[serde(
        with = "timestamp::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ips_updated: Option<DateTime<Utc>>,
    pub logs: Vec<LogEntry>,
    pub student_count: u64,
}

/// Every error response: `{ "error": "<message>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn test_session_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SessionStatus::Active).unwrap(), json!("active"));
        assert_eq!(serde_json::to_value(SessionStatus::Ended).unwrap(), json!("ended"));
        assert_eq!(SessionStatus::Ended.to_string(), "ended");
    }

    #[test]
    fn test_session_id_serializes_transparent() {
        let id = SessionId::from("A1B2C3D4");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("A1B2C3D4"));
        assert_eq!(id.to_string(), "A1B2C3D4");
    }

    #[test]
    fn test_session_info_omits_ips_updated_until_set() {
        let info = SessionInfo {
            session_id: "ABCDEF12".into(),
            session_code: "4321".into(),
            contest_name: "Finals".into(),
            allowed_ips: vec![],
            status: SessionStatus::Active,
            created_at: at(0),
            ended_at: None,
            ips_updated: None,
            logs: vec![],
            student_count: 0,
        };

        let value = serde_json::to_value(&info).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("ips_updated"));
        assert!(!object.contains_key("admin_token"));
        // ended_at is present but null before the session ends.
        assert_eq!(object["ended_at"], json!(null));
        assert_eq!(object["created_at"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_session_info_includes_ips_updated_once_set() {
        let info = SessionInfo {
            session_id: "ABCDEF12".into(),
            session_code: "4321".into(),
            contest_name: "Finals".into(),
            allowed_ips: vec!["10.0.0.0/8".into()],
            status: SessionStatus::Ended,
            created_at: at(0),
            ended_at: Some(at(120)),
            ips_updated: Some(at(60)),
            logs: vec![],
            student_count: 2,
        };

        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["ips_updated"], json!("1970-01-01T00:01:00Z"));
        assert_eq!(value["ended_at"], json!("1970-01-01T00:02:00Z"));
        assert_eq!(value["status"], json!("ended"));
    }

    #[test]
    fn test_log_entry_wire_shape() {
        let entry = LogEntry {
            timestamp: at(3600),
            student_id: "s-17".into(),
            hostname: "lab-pc-04".into(),
            event: "blocked".into(),
            detail: "8.8.8.8:53".into(),
        };

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "timestamp": "1970-01-01T01:00:00Z",
                "student_id": "s-17",
                "hostname": "lab-pc-04",
                "event": "blocked",
                "detail": "8.8.8.8:53",
            })
        );
    }
}
