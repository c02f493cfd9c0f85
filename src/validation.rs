// Validation utilities module
// Custom field rules plus the JSON extractor that runs them at the boundary

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// Validates that a text field is not only whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("Value must not be blank"));
        Err(error)
    } else {
        Ok(())
    }
}

/// Deserializes a string with surrounding whitespace removed, so length
/// rules see the value that gets stored
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

/// [`trimmed`] for optional fields
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
        .map(|value| value.map(|v| v.trim().to_string()))
}

/// Lower-cases and trims an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Field error for a confirmation value that differs from the original
pub fn mismatch_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("must_match");
    error.message = Some(Cow::from(message));
    error
}

/// Request bodies that carry rules the derive cannot express (cross-field checks)
pub trait RequestRules: Validate {
    /// Adds cross-field failures to `errors`
    fn cross_check(&self, _errors: &mut ValidationErrors) {}

    /// Runs derived field rules and cross-field rules together
    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.cross_check(&mut errors);

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// JSON body extractor that rejects malformed or invalid input with a 400
/// envelope before any handler logic runs
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + RequestRules,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

        value.check()?;
        Ok(ValidatedJson(value))
    }
}

/// Parses a path identifier, rejecting anything that is not a UUID
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid ID format".to_string()))
}
