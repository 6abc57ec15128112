//! Error types for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contestguard_protocol::ErrorBody;
use contestguard_session::SessionError;

/// Errors that stop the server itself (not a single request).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket couldn't be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A request that ends in an error response.
///
/// Every variant renders as `{ "error": "<message>" }` with the matching
/// status code. The `#[from]` on `Session` lets handlers use `?` directly
/// on registry calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No route matched the request path.
    #[error("Not found")]
    UnknownRoute,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Session(SessionError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::UnknownRoute => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use contestguard_protocol::ProtocolError;
    use contestguard_session::Role;

    use super::*;

    #[test]
    fn test_not_found_maps_to_404_with_fixed_message() {
        let err: ApiError = SessionError::NotFound("ABCDEF01".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Session not found");
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let err: ApiError = SessionError::Forbidden(Role::Admin).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Invalid admin token");
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = SessionError::InvalidInput(ProtocolError::InvalidIpList).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "allowed_ips must be a list of strings");
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = ApiError::UnknownRoute.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bind_error_mentions_address() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:5000".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("0.0.0.0:5000"));
    }
}
