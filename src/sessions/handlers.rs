// HTTP handlers for session management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::error::{ApiError, ErrorEnvelope};
use crate::models::{ApiResponse, MessageResponse, RevokedSessionsEnvelope, SessionListEnvelope};
use crate::sessions::models::{RevokedSessions, SessionList};
use crate::validation::parse_id;
use crate::AppState;

/// Valid sessions of the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "Sessions retrieved successfully", body = SessionListEnvelope),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
) -> Result<Json<ApiResponse<SessionList>>, ApiError> {
    let sessions = state.auth.list_sessions(&context).await?;
    Ok(Json(ApiResponse::with_data(
        "Sessions retrieved successfully",
        SessionList { sessions },
    )))
}

/// Revoke one of the caller's sessions
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session deleted successfully", body = MessageResponse),
        (status = 400, description = "Invalid ID format", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope),
        (status = 404, description = "Session not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id)?;
    state.auth.revoke_session(&context, id).await?;
    Ok(Json(ApiResponse::message("Session deleted successfully")))
}

/// Revoke every session of the caller except the current one
#[utoipa::path(
    delete,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "All other sessions deleted successfully", body = RevokedSessionsEnvelope),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "sessions"
)]
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
) -> Result<Json<ApiResponse<RevokedSessions>>, ApiError> {
    let deleted_sessions = state.auth.revoke_other_sessions(&context).await?;
    Ok(Json(ApiResponse::with_data(
        "All other sessions deleted successfully",
        RevokedSessions { deleted_sessions },
    )))
}
