//! Pulling credentials out of a request.
//!
//! The authorization guard compares two strings; this module decides which
//! string the caller presented. Sources are tried in order and the first
//! non-empty one wins:
//!
//! | role | 1st | 2nd | 3rd |
//! |---|---|---|---|
//! | admin | `X-Admin-Token` header | `admin_token` body field | `admin_token` query param |
//! | student | `X-Session-Code` header | `code` query param | |
//!
//! No credential at all yields `""`, which the guard always rejects.

use std::collections::HashMap;

use axum::http::HeaderMap;
use contestguard_protocol::text_field;
use serde_json::Value;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const SESSION_CODE_HEADER: &str = "x-session-code";

/// Query parameters as sent, last value winning on duplicates.
pub type QueryParams = HashMap<String, String>;

/// The admin token presented with a request.
pub fn admin_token(headers: &HeaderMap, body: &Value, query: &QueryParams) -> String {
    first_non_empty([
        header(headers, ADMIN_TOKEN_HEADER),
        text_field(body, "admin_token"),
        query.get("admin_token").cloned(),
    ])
}

/// The session code presented with a request.
pub fn session_code(headers: &HeaderMap, query: &QueryParams) -> String {
    first_non_empty([header(headers, SESSION_CODE_HEADER), query.get("code").cloned()])
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_admin_token_header_wins() {
        let token = admin_token(
            &headers(&[("x-admin-token", "from-header")]),
            &json!({"admin_token": "from-body"}),
            &query(&[("admin_token", "from-query")]),
        );
        assert_eq!(token, "from-header");
    }

    #[test]
    fn test_admin_token_body_before_query() {
        let token = admin_token(
            &HeaderMap::new(),
            &json!({"admin_token": "from-body"}),
            &query(&[("admin_token", "from-query")]),
        );
        assert_eq!(token, "from-body");
    }

    #[test]
    fn test_admin_token_empty_sources_skipped() {
        let token = admin_token(
            &headers(&[("x-admin-token", "")]),
            &json!({"admin_token": ""}),
            &query(&[("admin_token", "from-query")]),
        );
        assert_eq!(token, "from-query");
    }

    #[test]
    fn test_admin_token_absent_is_empty() {
        assert_eq!(admin_token(&HeaderMap::new(), &json!({}), &QueryParams::new()), "");
    }

    #[test]
    fn test_session_code_header_then_query() {
        assert_eq!(
            session_code(&headers(&[("x-session-code", "1234")]), &query(&[("code", "9999")])),
            "1234"
        );
        assert_eq!(session_code(&HeaderMap::new(), &query(&[("code", "9999")])), "9999");
        assert_eq!(session_code(&HeaderMap::new(), &QueryParams::new()), "");
    }

    #[test]
    fn test_session_code_ignores_admin_sources() {
        let code = session_code(
            &headers(&[("x-admin-token", "secret")]),
            &query(&[("admin_token", "secret")]),
        );
        assert_eq!(code, "");
    }
}
