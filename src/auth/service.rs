// Authentication service - business logic layer
//
// Owns the (User, Session) lifecycle. Handlers and middleware call in here;
// nothing in this module knows about HTTP.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{
        AuthContext, AuthResponse, ChangePasswordRequest, RefreshResponse, Role, SignInRequest,
        SignUpRequest, UserResponse,
    },
    password::PasswordService,
    store::{NewUser, SessionFilter, SessionStore, StoreError, UserPatch, UserStore},
    token::{fingerprint, TokenError, TokenKind, TokenService},
};
use crate::sessions::models::SessionResponse;
use crate::validation::normalize_email;

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user and open their first session
    pub async fn sign_up(
        &self,
        request: SignUpRequest,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
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
                role: Role::User,
            })
            .await
            .map_err(duplicate_email)?;

        let response = self.open_session(user.into(), user_agent).await?;
        info!("User signed up: {}", response.user.id);
        Ok(response)
    }

    /// Verify credentials and open a new session. Prior sessions stay untouched.
    pub async fn sign_in(
        &self,
        request: SignInRequest,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            PasswordService::verify_dummy(&request.password).await;
            warn!("Sign-in failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify(&request.password, &user.password_hash).await {
            warn!("Sign-in failed: wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let response = self.open_session(user.into(), user_agent).await?;
        info!("User signed in: {}", response.user.id);
        Ok(response)
    }

    /// Invalidate the session the caller authenticated with. Idempotent.
    pub async fn sign_out(&self, context: &AuthContext) -> Result<(), AuthError> {
        let flipped = self.sessions.invalidate_by_id(context.session_id).await?;
        if flipped {
            info!("User {} signed out of session {}", context.user_id(), context.session_id);
        } else {
            debug!("Session {} was already invalid", context.session_id);
        }
        Ok(())
    }

    /// Mint a new access token for the session a refresh token refers to.
    /// The refresh token is not rotated.
    pub async fn refresh_access_token(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshResponse, AuthError> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self.tokens.verify(TokenKind::Refresh, token).map_err(|e| {
            warn!("Refresh token {} rejected: {}", fingerprint(token), e);
            AuthError::InvalidRefreshToken
        })?;

        match self.sessions.find_by_id(claims.sid).await? {
            Some(session) if session.valid && session.user_id == claims.sub => {}
            _ => {
                warn!("Refresh attempted for invalid session {}", claims.sid);
                return Err(AuthError::InvalidRefreshToken);
            }
        }

        if self.users.find_by_id(claims.sub).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let access_token = self.tokens.sign(TokenKind::Access, claims.sub, claims.sid)?;
        debug!("Access token refreshed for session {}", claims.sid);
        Ok(RefreshResponse { access_token })
    }

    /// Replace the password and invalidate every other session of the user
    pub async fn change_password(
        &self,
        context: &AuthContext,
        request: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        if request.new_password != request.new_password_confirmation {
            return Err(AuthError::PasswordMismatch {
                field: "new_password_confirmation",
                message: "New passwords do not match",
            });
        }

        let user = self
            .users
            .find_by_id(context.user_id())
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !PasswordService::verify(&request.current_password, &user.password_hash).await {
            warn!("Password change refused for user {}: wrong current password", user.id);
            return Err(AuthError::IncorrectCurrentPassword);
        }

        let password_hash = PasswordService::hash(&request.new_password).await?;
        self.users
            .update_by_id(user.id, UserPatch::password(password_hash))
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let invalidated = self
            .sessions
            .invalidate_many(SessionFilter::for_user(user.id).except(context.session_id))
            .await?;

        info!(
            "Password changed for user {}; {} other session(s) invalidated",
            user.id, invalidated
        );
        Ok(())
    }

    /// The Authenticate gate. Checks run in a fixed order and the first
    /// failure wins.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self
            .tokens
            .verify(TokenKind::Access, token)
            .map_err(|e| match e {
                TokenError::Expired => {
                    debug!("Expired access token {}", fingerprint(token));
                    AuthError::ExpiredToken
                }
                TokenError::Invalid => {
                    warn!("Invalid access token {}", fingerprint(token));
                    AuthError::InvalidToken
                }
            })?;

        match self.sessions.find_by_id(claims.sid).await? {
            Some(session) if session.valid && session.user_id == claims.sub => {}
            _ => return Err(AuthError::SessionInvalid),
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthContext {
            user: user.into(),
            session_id: claims.sid,
        })
    }

    /// Profile of the authenticated caller
    pub fn current_user(&self, context: &AuthContext) -> UserResponse {
        context.user.clone()
    }

    /// Valid sessions of the caller, newest first
    pub async fn list_sessions(
        &self,
        context: &AuthContext,
    ) -> Result<Vec<SessionResponse>, AuthError> {
        let sessions = self.sessions.list_valid_for_user(context.user_id()).await?;
        Ok(sessions
            .into_iter()
            .map(|s| SessionResponse::from_session(s, context.session_id))
            .collect())
    }

    /// Invalidate one valid session owned by the caller
    pub async fn revoke_session(
        &self,
        context: &AuthContext,
        session_id: Uuid,
    ) -> Result<(), AuthError> {
        let affected = self
            .sessions
            .invalidate_many(SessionFilter::for_user(context.user_id()).only(session_id))
            .await?;

        if affected == 0 {
            return Err(AuthError::SessionNotFound);
        }

        info!("User {} revoked session {}", context.user_id(), session_id);
        Ok(())
    }

    /// Invalidate every session of the caller except the current one
    pub async fn revoke_other_sessions(&self, context: &AuthContext) -> Result<u64, AuthError> {
        let affected = self
            .sessions
            .invalidate_many(SessionFilter::for_user(context.user_id()).except(context.session_id))
            .await?;

        info!("User {} revoked {} other session(s)", context.user_id(), affected);
        Ok(affected)
    }

    async fn open_session(
        &self,
        user: UserResponse,
        user_agent: &str,
    ) -> Result<AuthResponse, AuthError> {
        let session = self.sessions.create(user.id, user_agent).await?;
        let (access_token, refresh_token) = self.tokens.issue_pair(user.id, session.id)?;

        Ok(AuthResponse {
            user,
            access_token,
            refresh_token,
        })
    }
}

/// A unique violation on create means someone registered the email in between
pub(crate) fn duplicate_email(error: StoreError) -> AuthError {
    match error {
        StoreError::Duplicate(_) => AuthError::EmailAlreadyExists,
        other => AuthError::Store(other),
    }
}
