// User management DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::auth::models::{Gender, Role, UserResponse};
use crate::models::Pagination;
use crate::validation::{mismatch_error, trimmed, trimmed_opt, validate_not_blank, RequestRules};

/// Administrative create; same rules as sign-up plus an optional role
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"),
        custom = "validate_not_blank"
    )]
    #[serde(deserialize_with = "trimmed")]
    #[schema(example = "Grace")]
    pub first_name: String,
    #[validate(
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"),
        custom = "validate_not_blank"
    )]
    #[serde(deserialize_with = "trimmed")]
    #[schema(example = "Hopper")]
    pub last_name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    #[schema(example = "grace@x.com")]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub password_confirmation: String,
    pub gender: Gender,
    /// Defaults to `user`
    pub role: Option<Role>,
}

impl RequestRules for CreateUserRequest {
    fn cross_check(&self, errors: &mut ValidationErrors) {
        if self.password != self.password_confirmation {
            errors.add("password_confirmation", mismatch_error("Passwords do not match"));
        }
    }
}

/// Profile update. Absent fields are left unchanged; `role` is admin-only.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"),
        custom = "validate_not_blank"
    )]
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub first_name: Option<String>,
    #[validate(
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"),
        custom = "validate_not_blank"
    )]
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub role: Option<Role>,
}

impl RequestRules for UpdateUserRequest {}

/// One page of users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}
