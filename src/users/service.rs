// User management service
//
// Profile reads and updates for the caller, plus the administrative
// create/list/delete operations.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{AuthContext, Role, UserResponse},
    password::PasswordService,
    service::duplicate_email,
    store::{NewUser, SessionFilter, SessionStore, UserPatch, UserStore},
};
use crate::models::Pagination;
use crate::query::ValidatedPage;
use crate::users::models::{CreateUserRequest, UpdateUserRequest, UserList};
use crate::validation::normalize_email;

pub struct UserService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { users, sessions }
    }

    /// Only the account owner or an admin may touch an account
    fn ensure_owner_or_admin(context: &AuthContext, id: Uuid) -> Result<(), AuthError> {
        if context.user_id() == id || context.role() == Role::Admin {
            Ok(())
        } else {
            Err(AuthError::NotAccountOwner)
        }
    }

    pub async fn get(&self, context: &AuthContext, id: Uuid) -> Result<UserResponse, AuthError> {
        Self::ensure_owner_or_admin(context, id)?;

        self.users
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::AccountNotFound)
    }

    pub async fn update(
        &self,
        context: &AuthContext,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        Self::ensure_owner_or_admin(context, id)?;

        if request.role.is_some() && context.role() != Role::Admin {
            return Err(AuthError::RoleChangeForbidden);
        }

        let patch = UserPatch {
            first_name: request.first_name,
            last_name: request.last_name,
            gender: request.gender,
            role: request.role,
            password_hash: None,
        };

        if patch.is_empty() {
            return self.get(context, id).await;
        }

        let user = self
            .users
            .update_by_id(id, patch)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        info!("User {} updated by {}", user.id, context.user_id());
        Ok(user.into())
    }

    pub async fn list(&self, page: ValidatedPage) -> Result<UserList, AuthError> {
        let users = self.users.list(page.offset, u64::from(page.limit)).await?;
        let total = self.users.count().await?;

        Ok(UserList {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Create an account without opening a session for it
    pub async fn create(&self, request: CreateUserRequest) -> Result<UserResponse, AuthError> {
        if request.password != request.password_confirmation {
            return Err(AuthError::PasswordMismatch {
                field: "password_confirmation",
                message: "Passwords do not match",
            });
        }

        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = PasswordService::hash(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                gender: request.gender,
                role: request.role.unwrap_or_default(),
            })
            .await
            .map_err(duplicate_email)?;

        info!("User created: {} ({})", user.id, user.role);
        Ok(user.into())
    }

    /// Hard delete. Every session of the user stops authenticating.
    /// Sessions are only touched once the row is gone.
    pub async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        if !self.users.delete_by_id(id).await? {
            return Err(AuthError::AccountNotFound);
        }

        let invalidated = self
            .sessions
            .invalidate_many(SessionFilter::for_user(id))
            .await?;

        info!("User {} deleted; {} session(s) invalidated", id, invalidated);
        Ok(())
    }
}
