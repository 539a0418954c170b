// src/api/auth.rs

use crate::api::{types::ErrorResponse, ApiState};
use crate::auth::AuthUser;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

/// Resolve the bearer token to a user, before any storage is touched.
pub fn check_auth(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<AuthUser, (StatusCode, Json<ErrorResponse>)> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    state.verifier.verify(token).ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid or missing bearer token".into(),
        }),
    ))
}
