// Authentication module
// JWT-based authentication with server-side sessions: sign-up, sign-in,
// sign-out, refresh, password change and the request gates

pub mod error;
pub mod handlers;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{AuthenticatedUser, OptionalUser, RequireRole};
pub use models::{AuthContext, Role, User, UserResponse};
pub use service::AuthService;
