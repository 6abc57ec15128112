//! Session identifiers and shared secrets.
//!
//! Every session gets three values at creation, all drawn independently
//! from `rand::rng()` (a cryptographically secure, ChaCha-based generator
//! reseeded from the OS):
//!
//! | value | shape | who sees it |
//! |---|---|---|
//! | session id | 8 uppercase hex chars, e.g. `A3F7B2C1` | everyone |
//! | admin token | 48 lowercase hex chars (192 bits) | the admin, once |
//! | session code | 4 decimal digits, `1000..=9999` | students |
//!
//! The session code is deliberately weak: it's read off a projector or a
//! QR code, so it has to be typeable. The admin token is the real secret.

use contestguard_protocol::SessionId;
use rand::Rng;

/// Random bytes behind a session id (32 bits → 8 hex chars).
const SESSION_ID_BYTES: usize = 4;

/// Random bytes behind an admin token (192 bits → 48 hex chars).
const ADMIN_TOKEN_BYTES: usize = 24;

/// Inclusive range of student session codes.
const SESSION_CODE_RANGE: std::ops::RangeInclusive<u16> = 1000..=9999;

/// The freshly generated identity of a new session.
///
/// `Debug` is implemented by hand so the admin token never shows up in a
/// log line by accident.
#[derive(Clone)]
pub struct SessionSecrets {
    pub session_id: SessionId,
    pub admin_token: String,
    pub session_code: String,
}

impl SessionSecrets {
    /// Generates all three values independently.
    pub fn generate() -> Self {
        Self {
            session_id: generate_session_id(),
            admin_token: generate_admin_token(),
            session_code: generate_session_code(),
        }
    }
}

impl std::fmt::Debug for SessionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSecrets")
            .field("session_id", &self.session_id)
            .field("admin_token", &"<redacted>")
            .field("session_code", &self.session_code)
            .finish()
    }
}

/// Generates a session id: 8 uppercase hex characters.
///
/// With 2^32 possible ids the birthday bound is around 77,000 sessions
/// for a 50% collision chance, far beyond a single relay's lifetime. The
/// registry still refuses to overwrite an existing id and retries.
pub fn generate_session_id() -> SessionId {
    let bytes: [u8; SESSION_ID_BYTES] = rand::rng().random();
    SessionId(hex_encode(&bytes).to_uppercase())
}

/// Generates an admin token: 48 lowercase hex characters.
pub fn generate_admin_token() -> String {
    let bytes: [u8; ADMIN_TOKEN_BYTES] = rand::rng().random();
    hex_encode(&bytes)
}

/// Generates a 4-digit session code.
pub fn generate_session_code() -> String {
    rand::rng().random_range(SESSION_CODE_RANGE).to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_session_id_is_eight_uppercase_hex_chars() {
        for _ in 0..100 {
            let id = generate_session_id();
            assert_eq!(id.as_str().len(), 8);
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
                "unexpected id {id}"
            );
        }
    }

    #[test]
    fn test_generate_admin_token_is_48_hex_chars() {
        let token = generate_admin_token();
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_admin_token_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_admin_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_generate_session_code_in_range() {
        for _ in 0..1000 {
            let code = generate_session_code();
            assert_eq!(code.len(), 4);
            let value: u16 = code.parse().expect("numeric code");
            assert!((1000..=9999).contains(&value));
        }
    }

    #[test]
    fn test_session_secrets_debug_redacts_admin_token() {
        let secrets = SessionSecrets::generate();
        let printed = format!("{secrets:?}");
        assert!(!printed.contains(&secrets.admin_token));
        assert!(printed.contains("<redacted>"));
    }
}
