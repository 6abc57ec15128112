//! Route table for the relay server.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use contestguard_session::{SessionRegistry, SessionStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Builds the full application router over a registry.
///
/// | method | path | role |
/// |---|---|---|
/// | GET | `/health` | none |
/// | POST | `/session/create` | none |
/// | POST | `/session/{id}/ips` | admin |
/// | GET | `/session/{id}/ips` | student |
/// | GET | `/session/{id}/status` | student |
/// | POST | `/session/{id}/end` | admin |
/// | POST | `/session/{id}/log` | student |
/// | GET | `/session/{id}/logs` | admin |
/// | GET | `/session/{id}/info` | admin |
///
/// CORS is open to every origin: the admin dashboard is a static page
/// that may be served from anywhere.
pub fn router<S: SessionStore>(registry: Arc<SessionRegistry<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::<S>))
        .route("/session/create", post(handlers::create_session::<S>))
        .route(
            "/session/{id}/ips",
            post(handlers::set_allowed_ips::<S>).get(handlers::get_policy::<S>),
        )
        .route("/session/{id}/status", get(handlers::get_status::<S>))
        .route("/session/{id}/end", post(handlers::end_session::<S>))
        .route("/session/{id}/log", post(handlers::append_log::<S>))
        .route("/session/{id}/logs", get(handlers::get_logs::<S>))
        .route("/session/{id}/info", get(handlers::get_info::<S>))
        .fallback(handlers::unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}
