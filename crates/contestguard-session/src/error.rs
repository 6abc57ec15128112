//! Error types for the session layer.

use contestguard_protocol::{ProtocolError, SessionId};

use crate::Role;

/// Errors returned by registry operations.
///
/// Every variant is terminal for the request that caused it: nothing in
/// the session layer retries, and no variant affects any other session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given id.
    ///
    /// The message is fixed on purpose; the id is kept for logging only.
    #[error("Session not found")]
    NotFound(SessionId),

    /// The presented credential was missing or didn't match.
    ///
    /// Missing and wrong credentials produce the exact same error, so a
    /// caller can't learn which half of the check failed.
    #[error("{}", .0.rejection_message())]
    Forbidden(Role),

    /// The payload was rejected. The record is left untouched.
    #[error(transparent)]
    InvalidInput(#[from] ProtocolError),
}
