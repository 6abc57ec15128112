//! Session records: the server's entire state for one contest.
//!
//! A record tracks:
//! - WHO may touch it (admin token, student session code)
//! - WHAT the policy is (allowed IPs, active/ended status)
//! - WHAT students reported (the activity log, bounded)
//! - WHEN things happened (created, ended, last policy push)

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contestguard_protocol::{
    LogEntry, LogsReport, Policy, SessionId, SessionInfo, SessionStatus, StatusUpdate,
};

use crate::SessionSecrets;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Use `SessionConfig::default()` and override just the fields you need:
///
/// ```rust
/// use std::time::Duration;
/// use contestguard_session::SessionConfig;
///
/// let config = SessionConfig {
///     ended_retention: Some(Duration::from_secs(24 * 3600)),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.max_log_entries, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many log entries a session keeps. When an append goes over,
    /// the oldest entries are dropped.
    ///
    /// Default: 1000.
    pub max_log_entries: usize,

    /// How long an ended session is kept before it may be evicted.
    ///
    /// Default: `None`, meaning sessions live for the whole process
    /// lifetime and nothing is ever evicted.
    pub ended_retention: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 1000,
            ended_retention: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// One contest session.
///
/// The identity fields (`session_id`, `session_code`, admin token) are
/// assigned together at creation and never change. They are private, as
/// are `status` and `ended_at`: the only way to change the lifecycle is
/// [`end()`](Self::end), so an ended session can't be made active again.
///
/// ```compile_fail
/// use contestguard_protocol::SessionStatus;
/// use contestguard_session::{SessionRecord, SessionSecrets};
///
/// let mut record = SessionRecord::new(SessionSecrets::generate(), "C".into(), chrono::Utc::now());
/// record.end(chrono::Utc::now());
/// record.status = SessionStatus::Active;
/// ```
#[derive(Clone)]
pub struct SessionRecord {
    session_id: SessionId,
    session_code: String,
    admin_token: String,
    pub contest_name: String,
    /// Replaced wholesale on every policy push, never appended to.
    pub allowed_ips: Vec<String>,
    status: SessionStatus,
    pub created_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    pub ips_updated: Option<DateTime<Utc>>,
    /// Oldest first. `VecDeque` makes dropping from the front O(1).
    pub logs: VecDeque<LogEntry>,
    /// Successful policy fetches, not unique students: a student who
    /// fetches twice counts twice.
    pub student_count: u64,
}

impl SessionRecord {
    /// Builds a fresh, active record with an empty policy and log.
    pub fn new(secrets: SessionSecrets, contest_name: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id: secrets.session_id,
            session_code: secrets.session_code,
            admin_token: secrets.admin_token,
            contest_name,
            allowed_ips: Vec::new(),
            status: SessionStatus::Active,
            created_at: now,
            ended_at: None,
            ips_updated: None,
            logs: VecDeque::new(),
            student_count: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The 4-digit code students present.
    pub fn session_code(&self) -> &str {
        &self.session_code
    }

    /// The admin secret. Only the authorization guard and the create
    /// response need it.
    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// `None` until the session is ended.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Swaps in a fresh id after a key collision, before the record is
    /// stored.
    pub(crate) fn reassign_id(&mut self, id: SessionId) {
        self.session_id = id;
    }

    /// When the policy last changed: the last IP push, or creation time
    /// if the admin hasn't pushed anything yet.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.ips_updated.unwrap_or(self.created_at)
    }

    /// Replaces the allowed-IP list and stamps `ips_updated`.
    pub fn replace_allowed_ips(&mut self, ips: Vec<String>, now: DateTime<Utc>) {
        self.allowed_ips = ips;
        self.ips_updated = Some(now);
    }

    /// Marks the session ended at `now`.
    ///
    /// Calling this on an already-ended session re-stamps `ended_at`; the
    /// status stays `Ended` either way.
    pub fn end(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Ended;
        self.ended_at = Some(now);
    }

    /// Appends a log entry, then drops the oldest entries until at most
    /// `max_entries` remain.
    pub fn push_log(&mut self, entry: LogEntry, max_entries: usize) {
        self.logs.push_back(entry);
        while self.logs.len() > max_entries {
            self.logs.pop_front();
        }
    }

    /// Returns `true` once the session has ended and `retention` has
    /// passed since `ended_at`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        let Some(ended_at) = self.ended_at else {
            return false;
        };
        if self.status.is_active() {
            return false;
        }
        match chrono::Duration::from_std(retention) {
            Ok(retention) => ended_at + retention <= now,
            // A retention too large to represent never elapses.
            Err(_) => false,
        }
    }

    // -- Views ------------------------------------------------------------

    pub fn policy(&self) -> Policy {
        Policy {
            session_id: self.session_id.clone(),
            contest_name: self.contest_name.clone(),
            allowed_ips: self.allowed_ips.clone(),
            status: self.status,
            updated_at: self.updated_at(),
        }
    }

    pub fn status_update(&self) -> StatusUpdate {
        StatusUpdate {
            status: self.status,
            allowed_ips: self.allowed_ips.clone(),
            updated_at: self.updated_at(),
        }
    }

    pub fn logs_report(&self) -> LogsReport {
        LogsReport {
            session_id: self.session_id.clone(),
            contest_name: self.contest_name.clone(),
            student_count: self.student_count,
            log_count: self.logs.len(),
            logs: self.logs.iter().cloned().collect(),
        }
    }

    /// Everything except the admin token.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            session_code: self.session_code.clone(),
            contest_name: self.contest_name.clone(),
            allowed_ips: self.allowed_ips.clone(),
            status: self.status,
            created_at: self.created_at,
            ended_at: self.ended_at,
            ips_updated: self.ips_updated,
            logs: self.logs.iter().cloned().collect(),
            student_count: self.student_count,
        }
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_id", &self.session_id)
            .field("session_code", &self.session_code)
            .field("admin_token", &"<redacted>")
            .field("contest_name", &self.contest_name)
            .field("allowed_ips", &self.allowed_ips)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("ended_at", &self.ended_at)
            .field("ips_updated", &self.ips_updated)
            .field("log_count", &self.logs.len())
            .field("student_count", &self.student_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn record() -> SessionRecord {
        SessionRecord::new(
            SessionSecrets {
                session_id: "0000BEEF".into(),
                admin_token: "f".repeat(48),
                session_code: "1000".into(),
            },
            "Qualifier".into(),
            at(100),
        )
    }

    fn entry(n: usize) -> LogEntry {
        LogEntry {
            timestamp: at(0),
            student_id: format!("s{n}"),
            hostname: String::new(),
            event: "tick".into(),
            detail: String::new(),
        }
    }

    #[test]
    fn test_new_record_is_active_and_empty() {
        let r = record();
        assert_eq!(r.status(), SessionStatus::Active);
        assert!(r.allowed_ips.is_empty());
        assert!(r.logs.is_empty());
        assert_eq!(r.student_count, 0);
        assert_eq!(r.ended_at(), None);
        assert_eq!(r.ips_updated, None);
    }

    #[test]
    fn test_updated_at_falls_back_to_created_at() {
        let mut r = record();
        assert_eq!(r.updated_at(), at(100));

        r.replace_allowed_ips(vec!["10.0.0.0/8".into()], at(150));

        assert_eq!(r.updated_at(), at(150));
    }

    #[test]
    fn test_replace_allowed_ips_replaces_not_appends() {
        let mut r = record();
        r.replace_allowed_ips(vec!["a".into(), "b".into()], at(101));
        r.replace_allowed_ips(vec!["c".into()], at(102));
        assert_eq!(r.allowed_ips, vec!["c".to_string()]);
    }

    #[test]
    fn test_push_log_keeps_most_recent_entries() {
        let mut r = record();
        for n in 1..=15 {
            r.push_log(entry(n), 10);
        }

        assert_eq!(r.logs.len(), 10);
        assert_eq!(r.logs.front().unwrap().student_id, "s6");
        assert_eq!(r.logs.back().unwrap().student_id, "s15");
    }

    #[test]
    fn test_end_restamps_ended_at() {
        let mut r = record();
        r.end(at(200));
        r.end(at(300));
        assert_eq!(r.status(), SessionStatus::Ended);
        assert_eq!(r.ended_at(), Some(at(300)));
    }

    #[test]
    fn test_is_expired_only_after_retention() {
        let mut r = record();
        let retention = Duration::from_secs(60);
        assert!(!r.is_expired(at(10_000), retention), "active never expires");

        r.end(at(200));

        assert!(!r.is_expired(at(259), retention));
        assert!(r.is_expired(at(260), retention));
    }

    #[test]
    fn test_info_and_debug_hide_admin_token() {
        let r = record();
        let json = serde_json::to_string(&r.info()).unwrap();
        assert!(!json.contains(r.admin_token()));
        assert!(!format!("{r:?}").contains(r.admin_token()));
    }
}
