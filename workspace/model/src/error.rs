use thiserror::Error;

/// Errors raised by the entity layer.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Input rejected before touching the database.
    #[error("Validation error on '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A unique value is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Hashing or verifying a password failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ModelError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ModelError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Type alias for Result with ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
