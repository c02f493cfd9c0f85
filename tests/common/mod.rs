//! Shared helpers for the HTTP scenario tests.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use shopfront_api::{
    auth::models::{Gender, Role},
    config::Config,
    create_router,
    users::models::CreateUserRequest,
    AppState,
};

pub const PASSWORD: &str = "secret1";

/// Memory-backed test configuration.
pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORE_BACKEND", "memory"),
        ("JWT_SECRET", "test-access-secret"),
        ("JWT_REFRESH_SECRET", "test-refresh-secret"),
        ("JWT_EXPIRES_IN", "15m"),
        ("JWT_REFRESH_EXPIRES_IN", "7d"),
        ("APP_ENV", "production"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

/// Create a test server over the memory backend.
/// The returned state shares its stores with the server.
pub fn create_test_server() -> (TestServer, AppState) {
    let state = AppState::in_memory(test_config());
    let server = TestServer::new(create_router(state.clone())).expect("Failed to create test server");
    (server, state)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn signup_payload(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": PASSWORD,
        "passwordConfirmation": PASSWORD,
        "gender": "female"
    })
}

/// Sign up and return the `data` object (user plus both tokens).
pub async fn sign_up(server: &TestServer, email: &str) -> Value {
    let response = server
        .post("/api/v1/auth/signup")
        .json(&signup_payload(email))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    response.json::<Value>()["data"].clone()
}

/// Sign in and return the `data` object.
pub async fn sign_in(server: &TestServer, email: &str, password: &str) -> Value {
    let response = server
        .post("/api/v1/auth/signin")
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK, "{}", response.text());
    response.json::<Value>()["data"].clone()
}

pub fn access_token(data: &Value) -> String {
    data["accessToken"].as_str().expect("accessToken present").to_string()
}

pub fn refresh_token(data: &Value) -> String {
    data["refreshToken"].as_str().expect("refreshToken present").to_string()
}

/// Create an admin directly through the user service and sign it in.
pub async fn admin_token(server: &TestServer, state: &AppState, email: &str) -> String {
    state
        .users
        .create(CreateUserRequest {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            password_confirmation: PASSWORD.to_string(),
            gender: Gender::Female,
            role: Some(Role::Admin),
        })
        .await
        .expect("admin created");

    access_token(&sign_in(server, email, PASSWORD).await)
}

/// Status and body of an authenticated GET.
pub async fn get_with(server: &TestServer, path: &str, token: &str) -> (StatusCode, Value) {
    let response = server.get(path).add_header(AUTHORIZATION, bearer(token)).await;
    let status = response.status_code();
    (status, response.json::<Value>())
}
