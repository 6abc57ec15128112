//! Request handlers: one per route.
//!
//! Each handler does the same three things:
//!   1. Parse the body leniently and extract the presented credential
//!   2. Call the matching [`SessionRegistry`] operation
//!   3. Wrap the result in its response body
//!
//! Authorization and every session rule live in the registry; nothing
//! here touches a record directly. Bodies are taken as raw bytes rather
//! than through axum's `Json` extractor so a malformed body degrades to
//! defaults instead of becoming a 4xx.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use contestguard_protocol::{
    CreateSessionRequest, CreateSessionResponse, HealthResponse, IpsUpdatedResponse, LogAck,
    LogSubmission, LogsReport, Policy, SessionEnded, SessionId, SessionInfo, StatusUpdate,
    parse_body,
};
use contestguard_session::{SessionRegistry, SessionStore};

use crate::credentials::{self, QueryParams};
use crate::error::ApiError;

/// Shared state handed to every handler.
pub type Registry<S> = Arc<SessionRegistry<S>>;

/// `GET /health`
pub async fn health<S: SessionStore>(State(registry): State<Registry<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: registry.session_count().await,
        time: registry.now(),
    })
}

/// `POST /session/create`
pub async fn create_session<S: SessionStore>(
    State(registry): State<Registry<S>>,
    body: Bytes,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let request = CreateSessionRequest::from_body(&parse_body(&body));
    let record = registry.create(request.contest_name).await;

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: record.session_id().clone(),
            session_code: record.session_code().to_string(),
            admin_token: record.admin_token().to_string(),
            message: "Session created. Share session_id + session_code with students via QR."
                .to_string(),
        }),
    )
}

/// `POST /session/{id}/ips` (admin)
pub async fn set_allowed_ips<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IpsUpdatedResponse>, ApiError> {
    let body = parse_body(&body);
    let token = credentials::admin_token(&headers, &body, &query);

    let allowed_ips = registry
        .set_allowed_ips(&SessionId(id), &token, body.get("allowed_ips"))
        .await?;

    Ok(Json(IpsUpdatedResponse {
        message: "IPs updated".to_string(),
        count: allowed_ips.len(),
        allowed_ips,
    }))
}

/// `GET /session/{id}/ips` (student): counts toward `student_count`.
pub async fn get_policy<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Json<Policy>, ApiError> {
    let code = credentials::session_code(&headers, &query);
    Ok(Json(registry.get_policy(&SessionId(id), &code).await?))
}

/// `GET /session/{id}/status` (student): lightweight poll, not counted.
pub async fn get_status<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Json<StatusUpdate>, ApiError> {
    let code = credentials::session_code(&headers, &query);
    Ok(Json(registry.get_status(&SessionId(id), &code).await?))
}

/// `POST /session/{id}/end` (admin)
pub async fn end_session<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionEnded>, ApiError> {
    let token = credentials::admin_token(&headers, &parse_body(&body), &query);
    let ended_at = registry.end_session(&SessionId(id), &token).await?;

    Ok(Json(SessionEnded {
        message: "Session ended".to_string(),
        ended_at,
    }))
}

/// `POST /session/{id}/log` (student)
pub async fn append_log<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LogAck>, ApiError> {
    let code = credentials::session_code(&headers, &query);
    let submission = LogSubmission::from_body(&parse_body(&body));
    registry.append_log(&SessionId(id), &code, submission).await?;

    Ok(Json(LogAck {
        message: "Logged".to_string(),
    }))
}

/// `GET /session/{id}/logs` (admin)
pub async fn get_logs<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LogsReport>, ApiError> {
    let token = credentials::admin_token(&headers, &parse_body(&body), &query);
    Ok(Json(registry.get_logs(&SessionId(id), &token).await?))
}

/// `GET /session/{id}/info` (admin): the record minus the admin token.
pub async fn get_info<S: SessionStore>(
    State(registry): State<Registry<S>>,
    Path(id): Path<String>,
    Query(query): Query<QueryParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionInfo>, ApiError> {
    let token = credentials::admin_token(&headers, &parse_body(&body), &query);
    Ok(Json(registry.get_info(&SessionId(id), &token).await?))
}

/// Any path no route matches.
pub async fn unknown_route() -> ApiError {
    ApiError::UnknownRoute
}
