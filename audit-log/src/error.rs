//! Audit logging errors.

use thiserror::Error;

use common::errors::AppError;

/// Failures of the audit store. Never propagated to primary operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The audit store could not be reached or configured.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    /// An append was rejected by the store.
    #[error("audit write failed: {0}")]
    Write(String),

    /// An append did not finish in time.
    #[error("audit write timed out after {0} ms")]
    Timeout(u64),
}

impl From<mongodb::error::Error> for AuditError {
    fn from(err: mongodb::error::Error) -> Self {
        AuditError::Write(err.to_string())
    }
}

impl From<AuditError> for AppError {
    fn from(err: AuditError) -> Self {
        AppError::LoggingUnavailable(err.to_string())
    }
}
