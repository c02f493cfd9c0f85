// HTTP handlers for user endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::{middleware::AuthenticatedUser, models::UserResponse};
use crate::error::{ApiError, ErrorEnvelope};
use crate::models::{ApiResponse, MessageResponse, UserEnvelope, UserListEnvelope};
use crate::query::{PageParams, QueryValidator};
use crate::users::models::{CreateUserRequest, UpdateUserRequest, UserList};
use crate::validation::{parse_id, ValidatedJson};
use crate::AppState;

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "User profile retrieved successfully", body = UserEnvelope),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::with_data(
        "User profile retrieved successfully",
        state.auth.current_user(&context),
    ))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageParams),
    responses(
        (status = 200, description = "Users retrieved successfully", body = UserListEnvelope),
        (status = 400, description = "Invalid pagination", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid credentials", body = ErrorEnvelope),
        (status = 403, description = "Admin access required", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<UserList>>, ApiError> {
    let page = QueryValidator::validate(params)?;
    tracing::debug!("Listing users: page={}, limit={}", page.page, page.limit);

    let list = state.users.list(page).await?;
    Ok(Json(ApiResponse::with_data("Users retrieved successfully", list)))
}

/// Create a user (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserEnvelope),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 403, description = "Admin access required", body = ErrorEnvelope),
        (status = 409, description = "Email already registered", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = state.users.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("User created successfully", user)),
    ))
}

/// Fetch one user (self or admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserEnvelope),
        (status = 400, description = "Invalid ID format", body = ErrorEnvelope),
        (status = 403, description = "Not your account", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let id = parse_id(&id)?;
    let user = state.users.get(&context, id).await?;
    Ok(Json(ApiResponse::with_data("User retrieved successfully", user)))
}

/// Update a profile (self or admin; role changes admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserEnvelope),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 403, description = "Not allowed", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(context): AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let id = parse_id(&id)?;
    let user = state.users.update(&context, id, payload).await?;
    Ok(Json(ApiResponse::with_data("User updated successfully", user)))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted successfully", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = parse_id(&id)?;
    state.users.delete(id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
