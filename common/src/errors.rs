//! Error types shared by all crates.
//!
//! `AppError` covers failures that are surfaced to the caller (construction,
//! configuration). `StatementError` describes a failed statement and is carried
//! inside an `OperationResult` rather than returned as `Err`.

use thiserror::Error;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application level errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// The relational store could not be reached or the driver refused to connect.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// A statement was rejected or could not be decoded.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// The audit store is unreachable. Never fatal for primary operations.
    #[error("audit logging unavailable: {0}")]
    LoggingUnavailable(String),

    /// Configuration values failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Failure of a single statement executed through the facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// The driver rejected the statement (syntax, constraint, permissions...).
    #[error("{message}")]
    Rejected { message: String },

    /// The INSERT ran but the driver reported no generated key.
    #[error("statement affected {rows_affected} row(s) but produced no generated key")]
    NoGeneratedKey { rows_affected: u64 },

    /// No live relational connection is held.
    #[error("no open database connection")]
    NotConnected,

    /// A column value could not be converted.
    #[error("failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl StatementError {
    /// Wraps driver error text.
    pub fn rejected(message: impl Into<String>) -> Self {
        StatementError::Rejected {
            message: message.into(),
        }
    }
}
