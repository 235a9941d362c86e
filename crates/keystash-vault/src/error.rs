//! Error types for vault operations.

use thiserror::Error;

/// Convenience result alias for backend operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by persistence backends and the repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Project name already in use: {0}")]
    UniqueViolation(String),

    #[error("Malformed stored data: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

/// Convenience result alias for service operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The closed error taxonomy surfaced by the service layer.
///
/// Backends raise [`StoreError`]; the service maps every failure into one of
/// these variants and never leaks storage-layer error types to callers.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Input shape or semantic violation detected before touching storage.
    #[error("Validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// The referenced project or secret does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Project name collision.
    #[error("Project name already in use: {0}")]
    UniqueConstraint(String),

    /// Anything else. The message is generic and does not leak internals.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// A validation error for a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        VaultError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => VaultError::NotFound(what),
            StoreError::UniqueViolation(name) => VaultError::UniqueConstraint(name),
            other => {
                tracing::error!(error = %other, "storage operation failed");
                VaultError::Internal("storage operation failed".to_string())
            }
        }
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
