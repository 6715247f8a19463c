use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, warn};

use crate::api::validation::ErrorResponse;

/// Field name to the messages describing why it was rejected
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or malformed input
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    /// The write would break a uniqueness rule
    #[error("{0}")]
    Conflict(String),

    /// Missing or unknown bearer token
    #[error("Unauthenticated.")]
    Unauthenticated,

    /// The record belongs to another user
    #[error("Unauthorized")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Validation failure on a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        ServiceError::Validation { message, errors }
    }

    /// Validation failure built from collected field errors
    pub fn invalid(errors: FieldErrors) -> Self {
        ServiceError::Validation {
            message: summarize(&errors),
            errors,
        }
    }
}

/// First message, followed by a count of the remaining ones
pub fn summarize(errors: &FieldErrors) -> String {
    let mut messages = errors.values().flatten();
    let Some(first) = messages.next() else {
        return "The given data was invalid.".to_string();
    };
    match messages.count() {
        0 => first.clone(),
        1 => format!("{first} (and 1 more error)"),
        n => format!("{first} (and {n} more errors)"),
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Validation { .. } | ServiceError::Conflict(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            ServiceError::Database(e) => {
                error!("Database error: {}", e);
                ErrorResponse::message("Server Error")
            }
            ServiceError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ErrorResponse::message("Server Error")
            }
            ServiceError::Validation { message, errors } => {
                warn!("Validation error: {}", message);
                ErrorResponse {
                    message: message.clone(),
                    errors: Some(errors.clone()),
                }
            }
            other => {
                warn!("Request rejected with {}: {}", status.as_u16(), other);
                ErrorResponse::message(other.to_string())
            }
        };
        HttpResponse::build(status).json(body)
    }
}
