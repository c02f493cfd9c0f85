use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::models::{AuthResponse, RefreshResponse, UserResponse};
use crate::sessions::models::{RevokedSessions, SessionList};
use crate::users::models::UserList;

/// Success envelope wrapping every 2xx JSON body
///
/// `data` is omitted for message-only responses (sign-out, password change).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    AuthEnvelope = ApiResponse<AuthResponse>,
    RefreshEnvelope = ApiResponse<RefreshResponse>,
    UserEnvelope = ApiResponse<UserResponse>,
    UserListEnvelope = ApiResponse<UserList>,
    SessionListEnvelope = ApiResponse<SessionList>,
    RevokedSessionsEnvelope = ApiResponse<RevokedSessions>
)]
pub struct ApiResponse<T> {
    #[schema(example = true)]
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Message-only envelope, as documented in the OpenAPI schema
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "User signed out successfully")]
    pub message: String,
}

/// Pagination metadata for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub limit: u32,
    #[schema(example = 42)]
    pub total: u64,
    /// Total number of pages (zero when there are no items)
    #[schema(example = 5)]
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };

        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}
