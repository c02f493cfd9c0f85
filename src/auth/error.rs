// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::{models::Role, store::StoreError};
use crate::error::ApiError;
use crate::validation::mismatch_error;

/// Failures of the auth core and the request gates.
///
/// The `Display` text of client-facing variants is the message sent to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    // Credential lifecycle
    #[error("User with this email already exists")]
    EmailAlreadyExists,

    /// Unknown email and wrong password share this variant on purpose
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Confirmation field differs; carries the offending field name
    #[error("{message}")]
    PasswordMismatch {
        field: &'static str,
        message: &'static str,
    },

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    // Authenticate gate, in check order
    #[error("Access token is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid or expired session")]
    SessionInvalid,

    /// Token and session are fine but the user was deleted afterwards
    #[error("User not found")]
    UserNotFound,

    // Refresh
    #[error("Refresh token is required")]
    MissingRefreshToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    // Authorization
    /// A role gate ran without Authenticate having attached a context
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{} access required", .required.label())]
    InsufficientPermissions { required: Role, actual: Role },

    #[error("You can only access your own account")]
    NotAccountOwner,

    #[error("Only administrators can change roles")]
    RoleChangeForbidden,

    // Targeted resources
    #[error("Session not found")]
    SessionNotFound,

    #[error("User not found")]
    AccountNotFound,

    // Internal
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::PasswordMismatch { field, message } => {
                let mut errors = ValidationErrors::new();
                errors.add(field, mismatch_error(message));
                ApiError::Validation(errors)
            }
            AuthError::IncorrectCurrentPassword => ApiError::BadRequest(message),

            AuthError::EmailAlreadyExists => ApiError::Conflict(message),
            AuthError::Store(StoreError::Duplicate(field)) => {
                ApiError::Conflict(format!("Duplicate value for {}", field))
            }

            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::SessionInvalid
            | AuthError::UserNotFound
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::AuthenticationRequired => ApiError::Unauthorized(message),

            AuthError::InsufficientPermissions { .. }
            | AuthError::NotAccountOwner
            | AuthError::RoleChangeForbidden => ApiError::Forbidden(message),

            AuthError::SessionNotFound | AuthError::AccountNotFound => ApiError::NotFound(message),

            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) | AuthError::Store(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
