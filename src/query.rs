use std::borrow::Cow;

use serde::Deserialize;
use utoipa::IntoParams;
use validator::{ValidationError, ValidationErrors};

use crate::error::ApiError;

/// Default page when none is given
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size when none is given
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a client may ask for
pub const MAX_LIMIT: u32 = 100;

/// Pagination query parameters as sent by the client.
/// Kept as raw strings so a bad value becomes a validation envelope
/// instead of a bare extractor rejection.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-indexed, defaults to 1)
    #[param(value_type = Option<u32>, example = 1)]
    pub page: Option<String>,
    /// Items per page (1 to 100, defaults to 10)
    #[param(value_type = Option<u32>, example = 10)]
    pub limit: Option<String>,
}

/// Validated and normalized pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPage {
    pub page: u32,
    pub limit: u32,
    /// Rows to skip: `(page - 1) * limit`
    pub offset: u64,
}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes pagination parameters.
    /// Blank values fall back to the defaults.
    pub fn validate(params: PageParams) -> Result<ValidatedPage, ApiError> {
        let mut errors = ValidationErrors::new();

        let page = match Self::parse_param(params.page, DEFAULT_PAGE, u32::MAX) {
            Ok(page) => page,
            Err(()) => {
                errors.add("page", Self::error("page must be a positive integer"));
                DEFAULT_PAGE
            }
        };

        let limit = match Self::parse_param(params.limit, DEFAULT_LIMIT, MAX_LIMIT) {
            Ok(limit) => limit,
            Err(()) => {
                errors.add("limit", Self::error("limit must be an integer between 1 and 100"));
                DEFAULT_LIMIT
            }
        };

        if !errors.errors().is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(ValidatedPage {
            page,
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        })
    }

    /// Parses a positive integer no larger than `max`
    fn parse_param(raw: Option<String>, default: u32, max: u32) -> Result<u32, ()> {
        let Some(raw) = raw else {
            return Ok(default);
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(default);
        }

        match trimmed.parse::<u32>() {
            Ok(value) if (1..=max).contains(&value) => Ok(value),
            _ => Err(()),
        }
    }

    fn error(message: &'static str) -> ValidationError {
        let mut error = ValidationError::new("range");
        error.message = Some(Cow::from(message));
        error
    }
}
