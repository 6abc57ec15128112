//! The session registry: every contest session the relay knows about.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating sessions and handing out their secrets
//! - Replacing the allowed-IP policy and ending sessions (admin)
//! - Serving the policy and accepting activity logs (students)
//! - Optionally evicting long-ended sessions
//!
//! # Access control
//!
//! Every operation except `create`, `get`, and `session_count` takes the
//! credential the caller presented. The registry looks up the record,
//! runs the [authorization guard](crate::auth) against it, and only then
//! applies the operation, all under the record's lock. Errors therefore
//! come in a fixed order: NotFound, then Forbidden, then InvalidInput.
//!
//! # Concurrency
//!
//! `SessionRegistry` is `Send + Sync` and meant to be shared behind an
//! `Arc`. Locking is delegated to the [`SessionStore`]; see
//! [`MemoryStore`] for the in-memory discipline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contestguard_protocol::{
    LogEntry, LogSubmission, LogsReport, Policy, SessionId, SessionInfo, StatusUpdate,
    parse_ip_list,
};
use serde_json::Value;

use crate::auth::{authorize_admin, authorize_student};
use crate::secrets::{self, SessionSecrets};
use crate::{Clock, MemoryStore, SessionConfig, SessionError, SessionRecord, SessionStore, SystemClock};

/// Owns all session records and every rule about how they change.
///
/// ## Lifecycle of one session
///
/// ```text
/// create() ──→ [Active] ──end_session()──→ [Ended] ──evict_expired()──→ gone
///                 │  ↑                        │  ↑        (only with a
///                 └──┘                        └──┘         retention set)
///   set_allowed_ips(), get_policy(),    end_session() again re-stamps
///   get_status(), append_log(), ...     ended_at; reads keep working
/// ```
pub struct SessionRegistry<S: SessionStore = MemoryStore> {
    store: S,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry<MemoryStore> {
    /// A registry over a fresh [`MemoryStore`], using the system clock.
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(MemoryStore::new(), config)
    }
}

impl<S: SessionStore> SessionRegistry<S> {
    /// Creates a registry over the given store, using the system clock.
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a registry with an explicit clock.
    pub fn with_clock(store: S, config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The registry's idea of "now", as stamped on records.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a new active session and returns the full record,
    /// including the admin token.
    ///
    /// This is the only operation whose result carries the admin token.
    /// Never fails: if the generated id is already taken, a new one is
    /// drawn.
    pub async fn create(&self, contest_name: String) -> SessionRecord {
        let now = self.clock.now();
        let mut record = SessionRecord::new(SessionSecrets::generate(), contest_name, now);

        while self.store.insert(record.clone()).await.is_err() {
            tracing::warn!(session_id = %record.session_id(), "session id collision, regenerating");
            record.reassign_id(secrets::generate_session_id());
        }

        tracing::info!(
            session_id = %record.session_id(),
            contest_name = %record.contest_name,
            "session created"
        );
        record
    }

    /// Returns a snapshot of the record.
    ///
    /// No credential check: this is for in-process callers. The HTTP
    /// layer only exposes [`get_info`](Self::get_info).
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this id.
    pub async fn get(&self, id: &SessionId) -> Result<SessionRecord, SessionError> {
        self.store
            .read(id, SessionRecord::clone)
            .await
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Replaces the allowed-IP list (admin).
    ///
    /// `raw` is the `allowed_ips` field exactly as the admin sent it; a
    /// missing field clears the list. Returns the stored list.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: unknown id
    /// - [`SessionError::Forbidden`]: bad admin token
    /// - [`SessionError::InvalidInput`]: `raw` is not a list of strings;
    ///   the record is left unchanged
    pub async fn set_allowed_ips(
        &self,
        id: &SessionId,
        admin_token: &str,
        raw: Option<&Value>,
    ) -> Result<Vec<String>, SessionError> {
        let now = self.clock.now();
        let ips = self
            .apply(id, |record| {
                authorize_admin(record, admin_token)?;
                let ips = parse_ip_list(raw)?;
                record.replace_allowed_ips(ips.clone(), now);
                Ok(ips)
            })
            .await?;

        tracing::info!(session_id = %id, count = ips.len(), "allowed IPs updated");
        Ok(ips)
    }

    /// Returns the policy to a student and counts the fetch.
    ///
    /// `student_count` goes up by one on every successful call. It counts
    /// fetches, not distinct students.
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn get_policy(&self, id: &SessionId, code: &str) -> Result<Policy, SessionError> {
        let policy = self
            .apply(id, |record| {
                authorize_student(record, code)?;
                record.student_count += 1;
                Ok(record.policy())
            })
            .await?;

        tracing::debug!(session_id = %id, "policy fetched");
        Ok(policy)
    }

    /// Returns the current status and policy for polling.
    ///
    /// Unlike [`get_policy`](Self::get_policy) this leaves
    /// `student_count` alone: clients poll it every few seconds.
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn get_status(&self, id: &SessionId, code: &str) -> Result<StatusUpdate, SessionError> {
        self.inspect(id, |record| {
            authorize_student(record, code)?;
            Ok(record.status_update())
        })
        .await
    }

    /// Ends the session (admin) and returns the new `ended_at`.
    ///
    /// Ending an ended session succeeds again and re-stamps `ended_at`
    /// with the time of this call.
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn end_session(
        &self,
        id: &SessionId,
        admin_token: &str,
    ) -> Result<DateTime<Utc>, SessionError> {
        let now = self.clock.now();
        self.apply(id, |record| {
            authorize_admin(record, admin_token)?;
            record.end(now);
            Ok(())
        })
        .await?;

        tracing::info!(session_id = %id, ended_at = %now, "session ended");
        Ok(now)
    }

    /// Appends a student's log entry, stamped with the server's time.
    ///
    /// The log keeps at most [`SessionConfig::max_log_entries`] entries;
    /// older ones are dropped as new ones arrive.
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn append_log(
        &self,
        id: &SessionId,
        code: &str,
        submission: LogSubmission,
    ) -> Result<LogEntry, SessionError> {
        let max_entries = self.config.max_log_entries;
        let entry = LogEntry {
            timestamp: self.clock.now(),
            student_id: submission.student_id,
            hostname: submission.hostname,
            event: submission.event,
            detail: submission.detail,
        };

        self.apply(id, |record| {
            authorize_student(record, code)?;
            record.push_log(entry.clone(), max_entries);
            Ok(())
        })
        .await?;

        tracing::debug!(
            session_id = %id,
            student_id = %entry.student_id,
            event = %entry.event,
            "log entry appended"
        );
        Ok(entry)
    }

    /// Returns the whole activity log (admin).
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn get_logs(&self, id: &SessionId, admin_token: &str) -> Result<LogsReport, SessionError> {
        self.inspect(id, |record| {
            authorize_admin(record, admin_token)?;
            Ok(record.logs_report())
        })
        .await
    }

    /// Returns every field of the record except the admin token (admin).
    ///
    /// # Errors
    /// [`SessionError::NotFound`], [`SessionError::Forbidden`].
    pub async fn get_info(&self, id: &SessionId, admin_token: &str) -> Result<SessionInfo, SessionError> {
        self.inspect(id, |record| {
            authorize_admin(record, admin_token)?;
            Ok(record.info())
        })
        .await
    }

    /// Number of sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    /// Removes sessions that ended more than
    /// [`SessionConfig::ended_retention`] ago.
    ///
    /// Does nothing when no retention is configured. Active sessions are
    /// never evicted. Returns the evicted ids.
    pub async fn evict_expired(&self) -> Vec<SessionId> {
        let Some(retention) = self.config.ended_retention else {
            return Vec::new();
        };
        let now = self.clock.now();

        let mut evicted = Vec::new();
        for id in self.store.ids().await {
            // An end_session re-stamps ended_at, so expiry is checked under
            // the same lock as the removal.
            let removed = self
                .store
                .remove_if(&id, |record| record.is_expired(now, retention))
                .await;

            if removed.is_some() {
                tracing::info!(session_id = %id, "ended session evicted");
                evicted.push(id);
            }
        }
        evicted
    }

    // -- Internals ---------------------------------------------------------

    /// Runs a fallible mutation under the record's lock.
    async fn apply<R, F>(&self, id: &SessionId, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut SessionRecord) -> Result<R, SessionError> + Send,
        R: Send,
    {
        let result = self
            .store
            .update(id, f)
            .await
            .unwrap_or_else(|| Err(SessionError::NotFound(id.clone())));
        log_rejection(id, result)
    }

    /// Runs a fallible read under the record's lock.
    async fn inspect<R, F>(&self, id: &SessionId, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&SessionRecord) -> Result<R, SessionError> + Send,
        R: Send,
    {
        let result = self
            .store
            .read(id, f)
            .await
            .unwrap_or_else(|| Err(SessionError::NotFound(id.clone())));
        log_rejection(id, result)
    }
}

/// Rejections are the caller's fault, not the server's: log at debug.
fn log_rejection<R>(id: &SessionId, result: Result<R, SessionError>) -> Result<R, SessionError> {
    if let Err(e) = &result {
        tracing::debug!(session_id = %id, error = %e, "request rejected");
    }
    result
}

// =========================================================================
// Tests
// =========================================================================
