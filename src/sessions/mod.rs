// Session management module
// Lets a signed-in user see and revoke their own logins

pub mod handlers;
pub mod models;
