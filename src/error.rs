use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::store::StoreError;

/// Every failure the services can raise. The transport layer is the only
/// place these become status codes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: u64 },

    #[error("{reason}")]
    Authorization { reason: String },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{message}")]
    Conflict {
        resource: &'static str,
        message: String,
    },

    #[error("Internal Server Error")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: Option<&'static str>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: u64) -> Self {
        AppError::NotFound { resource, id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        AppError::Authorization {
            reason: reason.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        AppError::Unauthenticated(reason.into())
    }

    pub fn conflict(resource: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => {
                AppError::conflict(field, format!("{field} is already taken"))
            }
            StoreError::MissingReference(resource) => {
                AppError::validation(None, format!("referenced {resource} does not exist"))
            }
            other => {
                tracing::error!(error = %other, "Store error");
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        tracing::error!(error = %e, "Failed to encode token");
        AppError::Internal(e.to_string())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::Internal(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Authorization { .. } => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = Map::new();
        body.insert("message".into(), json!(self.to_string()));

        match self {
            AppError::Validation {
                field: Some(field), ..
            } => {
                body.insert("field".into(), json!(field));
            }
            AppError::NotFound { resource, id } => {
                body.insert("resource".into(), json!(resource));
                body.insert("id".into(), json!(id));
            }
            AppError::Conflict { resource, .. } => {
                body.insert("resource".into(), json!(resource));
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(
            AppError::validation(Some("email"), "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("Request", 4).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::forbidden("no").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::unauthenticated("no").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::conflict("Department", "busy").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn duplicate_store_value_becomes_conflict() {
        let err: AppError = StoreError::Duplicate("email").into();
        assert!(matches!(err, AppError::Conflict { resource: "email", .. }));
    }
}
