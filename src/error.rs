use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use model::ModelError;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Field name to the list of messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input")]
    Validation(FieldErrors),
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation error carrying a single message for `field`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![message.into()]);
        ApiError::Validation(fields)
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|err| match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value ({})", err.code),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        ApiError::Validation(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        // serde reports a missing member as "missing field `name`"
        let missing = detail
            .split_once("missing field `")
            .and_then(|(_, rest)| rest.split_once('`'))
            .map(|(field, _)| field.to_string());

        match missing {
            Some(field) => ApiError::field(field, "This field is required."),
            None => ApiError::field("non_field_errors", detail),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation { field, message } => ApiError::field(field, message),
            ModelError::Conflict(message) => ApiError::Conflict(message),
            ModelError::Database(db_err) => ApiError::Database(db_err),
            ModelError::PasswordHash(e) => ApiError::Internal(format!("Password hashing failed: {e}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Server-side failures keep their details in the logs only
        let (message, fields) = match self {
            ApiError::Validation(fields) => ("Invalid input".to_string(), Some(fields)),
            ApiError::Database(ref e) => {
                error!("Database error while handling request: {}", e);
                ("Internal server error".to_string(), None)
            }
            ApiError::Storage(ref e) => {
                error!("Storage error while handling request: {}", e);
                ("Internal server error".to_string(), None)
            }
            ApiError::Internal(ref msg) => {
                error!("Internal error while handling request: {}", msg);
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
