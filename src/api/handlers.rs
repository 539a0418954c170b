// src/api/handlers.rs

use crate::api::{auth, types::*, ApiState};
use crate::infra::errors::WayfarerError;
use crate::ledger::{Message, MessageDraft, Role, Session};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

/// GET /sessions — List the caller's sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Session>>, (StatusCode, Json<ErrorResponse>)> {
    let user = auth::check_auth(&state, &headers)?;

    let sessions = state
        .store
        .list_sessions(user.user_id)
        .await
        .map_err(into_response)?;
    Ok(Json(sessions))
}

/// POST /sessions — Create a session for the caller.
pub async fn create_session(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<Session>, (StatusCode, Json<ErrorResponse>)> {
    let user = auth::check_auth(&state, &headers)?;

    let session = state
        .store
        .create_session(user.user_id, body.title)
        .await
        .map_err(into_response)?;
    Ok(Json(session))
}

/// GET /sessions/{id} — Ordered, deduplicated message list.
pub async fn read_messages(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, (StatusCode, Json<ErrorResponse>)> {
    let user = auth::check_auth(&state, &headers)?;

    let messages = state
        .store
        .read_messages(id, user.user_id)
        .await
        .map_err(into_response)?;
    Ok(Json(messages))
}

/// DELETE /sessions/{id} — Delete a session and all of its messages.
pub async fn delete_session(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = auth::check_auth(&state, &headers)?;

    state
        .store
        .delete_session(id, user.user_id)
        .await
        .map_err(into_response)?;
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /sessions/{id}/messages — Append a batch of turns.
pub async fn append_messages(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<AppendRequest>,
) -> Result<Json<AppendResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = auth::check_auth(&state, &headers)?;

    let candidates: Vec<MessageDraft> = body
        .messages
        .iter()
        .map(|m| MessageDraft::new(Role::normalize(&m.role), m.content.clone()))
        .collect();

    let outcome = state
        .store
        .append_messages(id, user.user_id, candidates, body.title)
        .await
        .map_err(into_response)?;

    Ok(Json(AppendResponse {
        saved_count: outcome.saved_count,
        total_count: outcome.total_count,
    }))
}

/// Map ledger errors onto the HTTP surface.
fn into_response(err: WayfarerError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        WayfarerError::Unauthorized => StatusCode::UNAUTHORIZED,
        WayfarerError::NotFound => StatusCode::NOT_FOUND,
        WayfarerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("storage failure: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
