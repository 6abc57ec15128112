//! Authorization guard: who may touch a session.
//!
//! There are two roles and each one proves itself with a shared secret
//! stored on the session record:
//!
//! - **Admin**: presents the `admin_token` handed out at creation.
//! - **Student**: presents the 4-digit `session_code` shown in the room.
//!
//! The guard is a pair of pure functions over `(record, presented string)`.
//! Pulling the string out of a header, body, or query string is the HTTP
//! layer's job; nothing here knows where the credential came from.
//!
//! The session status is never consulted. An ended session still
//! authorizes, so students can read the final status after the lockdown
//! is lifted.

use std::fmt;

use crate::{SessionError, SessionRecord};

/// The two caller roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// The message returned to a caller whose credential was rejected.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            Self::Admin => "Invalid admin token",
            Self::Student => "Invalid session code",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Student => write!(f, "student"),
        }
    }
}

/// Checks a presented admin token against the record.
///
/// # Errors
/// [`SessionError::Forbidden`] on any mismatch, including an empty token.
pub fn authorize_admin(record: &SessionRecord, presented: &str) -> Result<(), SessionError> {
    authorize(Role::Admin, record.admin_token(), presented)
}

/// Checks a presented session code against the record.
///
/// # Errors
/// [`SessionError::Forbidden`] on any mismatch, including an empty code.
pub fn authorize_student(record: &SessionRecord, presented: &str) -> Result<(), SessionError> {
    authorize(Role::Student, record.session_code(), presented)
}

fn authorize(role: Role, expected: &str, presented: &str) -> Result<(), SessionError> {
    // The stored secrets are never empty, but an empty presented value
    // must not match even if one somehow were.
    if !presented.is_empty() && constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
        Ok(())
    } else {
        Err(SessionError::Forbidden(role))
    }
}

/// Compares two byte strings in time that depends only on their lengths.
///
/// A plain `==` returns at the first differing byte, which lets an
/// attacker recover a secret one byte at a time by measuring response
/// times. Here every byte of equal-length inputs is visited and the
/// differences are OR-ed together, so timing reveals nothing about where
/// the inputs differ. Differing lengths return early: the length of a
/// token is not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));

    // `black_box` keeps the optimizer from turning the fold back into an
    // early-exit comparison.
    std::hint::black_box(diff) == 0
}
