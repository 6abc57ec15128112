//! Wire protocol for ContestGuard.
//!
//! This crate defines what the relay server and its clients exchange:
//!
//! - **Types** ([`SessionId`], [`SessionStatus`], [`LogEntry`], response
//!   bodies): the structures that travel as JSON.
//! - **Timestamps** ([`timestamp`]): second-precision UTC, formatted
//!   `YYYY-MM-DDTHH:MM:SSZ`.
//! - **Payloads** ([`LogSubmission`], [`parse_ip_list`], ...): lenient
//!   parsing of what admins and students send.
//! - **Errors** ([`ProtocolError`]): the payloads we refuse.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum) → Protocol (wire types) → Session (registry + guard)
//! ```
//!
//! The protocol layer knows nothing about HTTP or storage.

mod error;
mod payload;
pub mod timestamp;
mod types;

pub use error::ProtocolError;
pub use payload::{
    CreateSessionRequest, DEFAULT_CONTEST_NAME, LogSubmission, UNKNOWN_STUDENT, parse_body,
    parse_ip_list, text_field,
};
pub use types::{
    CreateSessionResponse, ErrorBody, HealthResponse, IpsUpdatedResponse, LogAck, LogEntry,
    LogsReport, Policy, SessionEnded, SessionId, SessionInfo, SessionStatus, StatusUpdate,
};
