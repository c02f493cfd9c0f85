// HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};

use crate::auth::{
    middleware::AuthenticatedUser,
    models::{
        AuthResponse, ChangePasswordRequest, RefreshRequest, RefreshResponse, SignInRequest,
        SignUpRequest,
    },
};
use crate::error::{ApiError, ErrorEnvelope};
use crate::models::{ApiResponse, AuthEnvelope, MessageResponse, RefreshEnvelope};
use crate::validation::ValidatedJson;
use crate::AppState;

/// User-Agent of the caller, recorded on the session it opens
fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Register a new user
/// POST /api/v1/auth/signup
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User signed up successfully", body = AuthEnvelope),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope,
            example = json!({"success": false, "message": "User with this email already exists"}))
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    tracing::debug!("Sign-up request for {}", payload.email);

    let response = state.auth.sign_up(payload, user_agent(&headers)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("User signed up successfully", response)),
    ))
}

/// Sign in with email and password
/// POST /api/v1/auth/signin
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "User signed in successfully", body = AuthEnvelope),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 401, description = "Invalid email or password", body = ErrorEnvelope,
            example = json!({"success": false, "message": "Invalid email or password"}))
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<SignInRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let response = state.auth.sign_in(payload, user_agent(&headers)).await?;
    Ok(Json(ApiResponse::with_data("User signed in successfully", response)))
}

/// Sign out of the current session
/// POST /api/v1/auth/signout
#[utoipa::path(
    post,
    path = "/api/v1/auth/signout",
    responses(
        (status = 200, description = "User signed out successfully", body = MessageResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn sign_out(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth.sign_out(&context).await?;
    Ok(Json(ApiResponse::message("User signed out successfully")))
}

/// Mint a new access token from a refresh token
/// POST /api/v1/auth/refresh
///
/// An absent or unreadable body counts as a missing token (401), not a
/// validation error.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshEnvelope),
        (status = 401, description = "Missing, invalid or expired refresh token", body = ErrorEnvelope,
            example = json!({"success": false, "message": "Invalid refresh token"}))
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let refresh_token = payload.and_then(|Json(request)| request.refresh_token);
    let response = state
        .auth
        .refresh_access_token(refresh_token.as_deref())
        .await?;

    Ok(Json(ApiResponse::with_data("Token refreshed successfully", response)))
}

/// Change the caller's password and sign out every other session
/// POST /api/v1/auth/change-password
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Mismatched confirmation or wrong current password", body = ErrorEnvelope,
            example = json!({"success": false, "message": "Current password is incorrect"})),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth.change_password(&context, payload).await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}
