// Authentication middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{AuthContext, Role},
    service::AuthService,
};

/// Pulls the bearer token out of the Authorization header.
///
/// `Ok(None)` when the header is absent or blank. The scheme name is matched
/// case-insensitively; a value with another scheme is passed through as-is
/// and fails verification later.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

/// Authenticate gate: verifies the bearer token, the session it names and
/// the user behind it, then attaches an [`AuthContext`] to the request.
pub async fn authenticate(
    State(auth): State<Arc<AuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?.map(str::to_owned);
    let context = auth.authenticate(token.as_deref()).await?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Same checks as [`authenticate`], but any failure lets the request through
/// anonymously.
pub async fn optional_authenticate(
    State(auth): State<Arc<AuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.map(str::to_owned),
        Err(_) => None,
    };

    if let Some(token) = token {
        match auth.authenticate(Some(&token)).await {
            Ok(context) => {
                request.extensions_mut().insert(context);
            }
            Err(e) => debug!("Continuing anonymously: {}", e),
        }
    }

    next.run(request).await
}

/// Authorization middleware that requires a specific role.
///
/// Reads the context attached by [`authenticate`], so it must be layered
/// inside it.
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    required_role: Role,
}

impl RequireRole {
    /// Create a new RequireRole middleware with the specified role requirement
    pub fn new(required_role: Role) -> Self {
        Self { required_role }
    }

    /// Create a middleware that requires Admin role
    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    /// Create a middleware that requires User role
    pub fn user() -> Self {
        Self::new(Role::User)
    }

    /// Middleware function that validates role-based access
    pub async fn middleware(self, request: Request<Body>, next: Next) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        let Some(context) = request.extensions().get::<AuthContext>() else {
            warn!("Role check without authentication context on {}", endpoint);
            return Err(AuthError::AuthenticationRequired);
        };

        let user_role = context.role();
        if user_role != self.required_role {
            warn!(
                "Authorization failed: user_id={}, required_role={}, actual_role={}, endpoint={}",
                context.user_id(),
                self.required_role,
                user_role,
                endpoint
            );
            return Err(AuthError::InsufficientPermissions {
                required: self.required_role,
                actual: user_role,
            });
        }

        debug!(
            "Authorization successful: user_id={}, role={}, endpoint={}",
            context.user_id(),
            user_role,
            endpoint
        );
        Ok(next.run(request).await)
    }
}

/// `RequireRole(admin)` as a plain middleware function
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AuthError> {
    RequireRole::admin().middleware(request, next).await
}

/// Authenticated caller extractor for handlers behind [`authenticate`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::AuthenticationRequired)
    }
}

/// Caller identity when [`optional_authenticate`] attached one
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<AuthContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        memory::{MemorySessionStore, MemoryUserStore},
        models::{Gender, SignUpRequest, UserResponse},
        token::TokenService,
    };
    use crate::config::TokenConfig;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use axum_test::TestServer;
    use chrono::Utc;
    use serde_json::Value;
    use std::time::Duration;
    use uuid::Uuid;

    fn test_auth_service() -> Arc<AuthService> {
        let tokens = TokenService::new(&TokenConfig {
            access_secret: "access_secret_for_tests".to_string(),
            refresh_secret: "refresh_secret_for_tests".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(3600),
        });
        Arc::new(AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            tokens,
        ))
    }

    async fn signed_up_token(auth: &AuthService) -> String {
        auth.sign_up(
            SignUpRequest {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "a@x.com".to_string(),
                password: "secret1".to_string(),
                password_confirmation: "secret1".to_string(),
                gender: Gender::Female,
            },
            "test",
        )
        .await
        .unwrap()
        .access_token
    }

    fn context_with_role(role: Role) -> AuthContext {
        AuthContext {
            user: UserResponse {
                id: Uuid::new_v4(),
                email: "a@x.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                gender: Gender::Female,
                role,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            session_id: Uuid::new_v4(),
        }
    }

    async fn whoami(AuthenticatedUser(context): AuthenticatedUser) -> String {
        context.user.email
    }

    async fn maybe_whoami(OptionalUser(context): OptionalUser) -> String {
        context.map(|c| c.user.email).unwrap_or_else(|| "anonymous".to_string())
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
        assert_eq!(bearer_token(&headers_with("Bearer abc")).unwrap(), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer   ")).unwrap(), None);
        assert_eq!(bearer_token(&headers_with("")).unwrap(), None);
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")).unwrap(), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers_with("bearer abc")).unwrap(), Some("abc"));
        assert_eq!(bearer_token(&headers_with("BEARER abc")).unwrap(), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bEaReR\tabc")).unwrap(), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_authenticated_user_requires_context() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));

        parts.extensions.insert(context_with_role(Role::User));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_gate() {
        let auth = test_auth_service();
        let token = signed_up_token(&auth).await;
        let app = Router::new()
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(auth, authenticate));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/me").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "Access token is required");

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, "Bearer nonsense")
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "Invalid token");

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, format!("Bearer {}", token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "a@x.com");

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, format!("bearer {}", token))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optional_authenticate_never_fails() {
        let auth = test_auth_service();
        let token = signed_up_token(&auth).await;
        let app = Router::new()
            .route("/", get(maybe_whoami))
            .route_layer(middleware::from_fn_with_state(auth, optional_authenticate));
        let server = TestServer::new(app).unwrap();

        assert_eq!(server.get("/").await.text(), "anonymous");

        let response = server
            .get("/")
            .add_header(header::AUTHORIZATION, "Bearer broken")
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "anonymous");

        let response = server
            .get("/")
            .add_header(header::AUTHORIZATION, format!("Bearer {}", token))
            .await;
        assert_eq!(response.text(), "a@x.com");
    }

    #[tokio::test]
    async fn test_require_role_without_authenticate_is_unauthorized() {
        let app = Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(require_admin));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/admin").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["message"], "Authentication required");
    }

    async fn run_role_check(gate: RequireRole, role: Role) -> StatusCode {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
                gate.middleware(req, next)
            }))
            .layer(middleware::from_fn(move |mut req: Request<Body>, next: Next| async move {
                req.extensions_mut().insert(context_with_role(role));
                next.run(req).await
            }));
        let server = TestServer::new(app).unwrap();
        server.get("/").await.status_code()
    }

    #[tokio::test]
    async fn test_require_role_matches_exactly() {
        assert_eq!(run_role_check(RequireRole::admin(), Role::Admin).await, StatusCode::OK);
        assert_eq!(run_role_check(RequireRole::admin(), Role::User).await, StatusCode::FORBIDDEN);
        assert_eq!(run_role_check(RequireRole::user(), Role::User).await, StatusCode::OK);
        assert_eq!(run_role_check(RequireRole::user(), Role::Admin).await, StatusCode::FORBIDDEN);
    }
}
