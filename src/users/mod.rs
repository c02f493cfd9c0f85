// User management module
// Profile endpoints for the caller plus administrative user management

pub mod handlers;
pub mod models;
pub mod service;

pub use service::UserService;
