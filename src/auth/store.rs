// Persistence collaborators for users and sessions
//
// The auth core only talks to these traits. Postgres and in-memory
// implementations live in `repository` and `memory`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::models::{Gender, Role, Session, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated on the named field
    #[error("duplicate value for unique field '{0}'")]
    Duplicate(&'static str),

    /// A stored row could not be mapped back into the domain model
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields for a user about to be created. The email must already be normalised.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub role: Role,
}

/// Partial update of a user; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.gender.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }

    /// Applies the patch to an in-memory record
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(gender) = self.gender {
            user.gender = gender;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
    }
}

/// Selects the still-valid sessions of one user for a bulk invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFilter {
    pub user_id: Uuid,
    /// Restrict to this single session
    pub only: Option<Uuid>,
    /// Leave this session untouched
    pub except: Option<Uuid>,
}

impl SessionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            only: None,
            except: None,
        }
    }

    pub fn only(mut self, session_id: Uuid) -> Self {
        self.only = Some(session_id);
        self
    }

    pub fn except(mut self, session_id: Uuid) -> Self {
        self.except = Some(session_id);
        self
    }

    pub fn matches(&self, session: &Session) -> bool {
        session.valid
            && session.user_id == self.user_id
            && self.only.map_or(true, |id| session.id == id)
            && self.except.map_or(true, |id| session.id != id)
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::Duplicate("email")` when the email is taken
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns the updated user, or `None` when no user has this id
    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    /// Returns whether a user was deleted
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Newest first
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<User>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Session store
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: Uuid, user_agent: &str) -> Result<Session, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Single targeted update. Idempotent: returns whether a valid session was flipped.
    async fn invalidate_by_id(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Single filtered multi-row update, atomic in the backend. Returns the affected count.
    async fn invalidate_many(&self, filter: SessionFilter) -> Result<u64, StoreError>;

    /// Valid sessions of a user, newest first
    async fn list_valid_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError>;
}
