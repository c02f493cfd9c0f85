// Error handling module for the Shopfront API
// Provides the boundary error type and the uniform JSON error envelope

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::config::Environment;

/// Boundary error type. Every handler and gate ends up here.
///
/// Each variant maps to exactly one HTTP status; domain errors are
/// translated into one of these before reaching the client.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation failures from request DTOs
    /// Maps to HTTP 400 Bad Request
    Validation(validator::ValidationErrors),

    /// Request body could not be decoded at all
    /// Maps to HTTP 400 Bad Request
    InvalidBody(String),

    /// Well-formed request that the operation refuses
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Uniqueness violation
    /// Maps to HTTP 409 Conflict
    Conflict(String),

    /// Authentication failures
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Authorization failures
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// Targeted resource (or route) absent
    /// Maps to HTTP 404 Not Found
    NotFound(String),

    /// Store or unexpected failures
    /// Maps to HTTP 500 Internal Server Error. The detail never reaches
    /// production clients.
    Internal(String),
}

/// One failed field in a validation error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "passwordConfirmation")]
    pub field: String,
    #[schema(example = "Passwords do not match")]
    pub message: String,
}

/// Error envelope shared by every failing response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Invalid email or password")]
    pub message: String,
    /// Present only for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Internal error text, only in development mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            error: None,
        }
    }
}

/// Development-only copy of an error envelope with the internal detail filled in.
/// Carried in response extensions until `expose_error_details` decides to use it.
#[derive(Debug, Clone)]
struct DetailedEnvelope(ErrorEnvelope);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope, detail) = self.to_error_response();
        let mut response = (status, Json(envelope.clone())).into_response();

        if let Some(detail) = detail {
            let mut detailed = envelope;
            detailed.error = Some(detail);
            response.extensions_mut().insert(DetailedEnvelope(detailed));
        }

        response
    }
}

impl ApiError {
    /// Convert ApiError to status code, client envelope and optional internal detail
    ///
    /// Logging levels:
    /// - error!: internal failures (500-level)
    /// - warn!: security-relevant client failures (401, 403, 409)
    /// - debug!: expected client failures (validation, not found)
    fn to_error_response(&self) -> (StatusCode, ErrorEnvelope, Option<String>) {
        match self {
            ApiError::Validation(errors) => {
                debug!("Validation error: {:?}", errors);

                let mut envelope = ErrorEnvelope::new("Validation Error");
                envelope.errors = Some(field_errors(errors));
                (StatusCode::BAD_REQUEST, envelope, None)
            }
            ApiError::InvalidBody(reason) => {
                debug!("Malformed request body: {}", reason);

                let mut envelope = ErrorEnvelope::new("Validation Error");
                envelope.errors = Some(vec![FieldError {
                    field: "body".to_string(),
                    message: reason.clone(),
                }]);
                (StatusCode::BAD_REQUEST, envelope, None)
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, ErrorEnvelope::new(message.clone()), None)
            }
            ApiError::Conflict(message) => {
                warn!("Conflict error: {}", message);
                (StatusCode::CONFLICT, ErrorEnvelope::new(message.clone()), None)
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                (StatusCode::UNAUTHORIZED, ErrorEnvelope::new(message.clone()), None)
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (StatusCode::FORBIDDEN, ErrorEnvelope::new(message.clone()), None)
            }
            ApiError::NotFound(message) => {
                debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, ErrorEnvelope::new(message.clone()), None)
            }
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorEnvelope::new("Internal server error"),
                    Some(detail.clone()),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

/// Flatten validator errors into a stable, sorted list with camelCase field names
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut flat: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, failures)| {
            let field = camel_case(field);
            failures.iter().map(move |failure| FieldError {
                field: field.clone(),
                message: failure
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| failure.code.to_string()),
            })
        })
        .collect();

    flat.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    flat
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Response-mapping layer: in development mode, swap error bodies for the
/// variant carrying internal detail. Production responses pass through untouched.
pub async fn expose_error_details(
    State(environment): State<Environment>,
    mut response: Response,
) -> Response {
    if !environment.is_development() {
        return response;
    }

    match response.extensions_mut().remove::<DetailedEnvelope>() {
        Some(DetailedEnvelope(envelope)) => (response.status(), Json(envelope)).into_response(),
        None => response,
    }
}
