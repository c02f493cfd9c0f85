// Shopfront API
// Account and session lifecycle service: sign-up, sign-in, refresh,
// session management and administrative user endpoints over axum.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod sessions;
pub mod users;
pub mod validation;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::handlers as auth_handlers;
use auth::{
    memory::{MemorySessionStore, MemoryUserStore},
    middleware::{authenticate, optional_authenticate, require_admin, OptionalUser},
    models::Role,
    store::{SessionStore, UserStore},
    token::TokenService,
    AuthService,
};
use config::Config;
use error::{expose_error_details, ApiError};
use models::ApiResponse;
use sessions::handlers as session_handlers;
use users::handlers as user_handlers;
use users::UserService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::sign_up,
        auth::handlers::sign_in,
        auth::handlers::sign_out,
        auth::handlers::refresh,
        auth::handlers::change_password,
        users::handlers::current_user,
        users::handlers::list_users,
        users::handlers::create_user,
        users::handlers::get_user,
        users::handlers::update_user,
        users::handlers::delete_user,
        sessions::handlers::list_sessions,
        sessions::handlers::revoke_session,
        sessions::handlers::revoke_other_sessions,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::Gender,
            auth::models::UserResponse,
            auth::models::SignUpRequest,
            auth::models::SignInRequest,
            auth::models::RefreshRequest,
            auth::models::ChangePasswordRequest,
            auth::models::AuthResponse,
            auth::models::RefreshResponse,
            users::models::CreateUserRequest,
            users::models::UpdateUserRequest,
            users::models::UserList,
            sessions::models::SessionResponse,
            sessions::models::SessionList,
            sessions::models::RevokedSessions,
            models::Pagination,
            models::MessageResponse,
            models::AuthEnvelope,
            models::RefreshEnvelope,
            models::UserEnvelope,
            models::UserListEnvelope,
            models::SessionListEnvelope,
            models::RevokedSessionsEnvelope,
            error::ErrorEnvelope,
            error::FieldError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-up, sign-in, token refresh and password management"),
        (name = "users", description = "Profiles and administrative user management"),
        (name = "sessions", description = "Active login sessions of the caller")
    ),
    info(
        title = "Shopfront API",
        version = "1.0.0",
        description = "Account and session management for the Shopfront backend"
    )
)]
pub struct ApiDoc;

/// Registers the `bearerAuth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.tokens);
        let auth = AuthService::new(users.clone(), sessions.clone(), tokens);

        Self {
            auth: Arc::new(auth),
            users: Arc::new(UserService::new(users, sessions)),
            config: Arc::new(config),
        }
    }

    /// State backed by the in-memory stores
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }
}

#[derive(Debug, Serialize)]
struct Viewer {
    email: String,
    role: Role,
}

#[derive(Debug, Serialize)]
struct ApiIndex {
    name: &'static str,
    version: &'static str,
    endpoints: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewer: Option<Viewer>,
}

const ENDPOINTS: &[&str] = &[
    "POST /api/v1/auth/signup",
    "POST /api/v1/auth/signin",
    "POST /api/v1/auth/signout",
    "POST /api/v1/auth/refresh",
    "POST /api/v1/auth/change-password",
    "GET /api/v1/users/me",
    "GET /api/v1/users",
    "POST /api/v1/users",
    "GET /api/v1/users/{id}",
    "PUT /api/v1/users/{id}",
    "DELETE /api/v1/users/{id}",
    "GET /api/v1/sessions",
    "DELETE /api/v1/sessions",
    "DELETE /api/v1/sessions/{id}",
];

/// Handler for GET /api/v1
/// Lists the endpoints and, for a recognised caller, who they are
async fn api_index(OptionalUser(viewer): OptionalUser) -> Json<ApiResponse<ApiIndex>> {
    let viewer = viewer.map(|context| Viewer {
        email: context.user.email,
        role: context.user.role,
    });

    Json(ApiResponse::with_data(
        "Shopfront API",
        ApiIndex {
            name: "shopfront-api",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: ENDPOINTS.to_vec(),
            viewer,
        },
    ))
}

async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}

/// `*` allows any origin; otherwise a comma separated origin list
fn cors_layer(origin: &str) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = CorsLayer::new().allow_methods(methods).allow_headers(Any);

    let origins: Vec<HeaderValue> = origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let authenticated = middleware::from_fn_with_state(state.auth.clone(), authenticate);

    let public_routes = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/api/v1/auth/signup", post(auth_handlers::sign_up))
        .route("/api/v1/auth/signin", post(auth_handlers::sign_in))
        .route("/api/v1/auth/refresh", post(auth_handlers::refresh));

    let index_routes = Router::new()
        .route("/api/v1", get(api_index))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            optional_authenticate,
        ));

    // Role gates sit inside Authenticate so they see the attached context
    let protected_routes = Router::new()
        .route("/api/v1/auth/signout", post(auth_handlers::sign_out))
        .route(
            "/api/v1/auth/change-password",
            post(auth_handlers::change_password),
        )
        .route("/api/v1/users/me", get(user_handlers::current_user))
        .route(
            "/api/v1/users",
            get(user_handlers::list_users)
                .post(user_handlers::create_user)
                .route_layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/v1/users/:id",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .merge(
                    delete(user_handlers::delete_user)
                        .route_layer(middleware::from_fn(require_admin)),
                ),
        )
        .route(
            "/api/v1/sessions",
            get(session_handlers::list_sessions).delete(session_handlers::revoke_other_sessions),
        )
        .route(
            "/api/v1/sessions/:id",
            delete(session_handlers::revoke_session),
        )
        .route_layer(authenticated);

    let environment = state.config.environment;
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(index_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(middleware::map_response_with_state(
            environment,
            expose_error_details,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

