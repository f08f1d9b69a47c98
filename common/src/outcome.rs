//! Operation result wrapper.
//!
//! Every facade verb returns an `OperationResult`: success flag, value on
//! success, statement error on failure, plus metadata. Callers that still
//! expect the legacy sentinels (`-1`, empty sequence) can ask for them.

use chrono::{DateTime, Utc};

use crate::errors::StatementError;
use crate::models::{OperationKind, ResultRow};

/// Sentinel returned by the legacy integer accessors when an operation failed.
pub const FAILURE_SENTINEL: i64 = -1;

/// Outcome of one statement executed through the facade.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult<T> {
    /// Whether the statement succeeded.
    pub success: bool,

    /// Result value (present on success).
    pub value: Option<T>,

    /// Failure detail (present on failure).
    pub error: Option<StatementError>,

    /// Operation metadata.
    pub meta: OperationMeta,
}

/// Metadata attached to every result.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMeta {
    /// Statement kind.
    pub operation: OperationKind,

    /// Completion timestamp.
    pub timestamp: DateTime<Utc>,

    /// Driver round-trip time in milliseconds.
    pub duration_ms: u64,
}

impl OperationMeta {
    fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            timestamp: Utc::now(),
            duration_ms: 0,
        }
    }
}

impl<T> OperationResult<T> {
    /// Creates a successful result.
    pub fn ok(operation: OperationKind, value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            meta: OperationMeta::new(operation),
        }
    }

    /// Creates a failed result.
    pub fn failed(operation: OperationKind, error: StatementError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
            meta: OperationMeta::new(operation),
        }
    }

    /// Sets the duration on the result.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = duration_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&StatementError> {
        self.error.as_ref()
    }

    /// Error text as it is written to the audit trail.
    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, StatementError> {
        match (self.value, self.error) {
            (Some(value), None) => Ok(value),
            (_, Some(error)) => Err(error),
            (None, None) => Err(StatementError::rejected("operation produced no value")),
        }
    }
}

impl OperationResult<u64> {
    /// Affected-row count, or `-1` on failure.
    pub fn or_sentinel(&self) -> i64 {
        self.value
            .map(|v| i64::try_from(v).unwrap_or(i64::MAX))
            .unwrap_or(FAILURE_SENTINEL)
    }
}

impl OperationResult<i64> {
    /// Generated key, or `-1` on failure.
    pub fn or_sentinel(&self) -> i64 {
        self.value.unwrap_or(FAILURE_SENTINEL)
    }
}

impl OperationResult<Vec<ResultRow>> {
    /// Number of rows returned (0 on failure).
    pub fn row_count(&self) -> usize {
        self.value.as_ref().map_or(0, Vec::len)
    }

    /// Rows in driver order, or an empty sequence on failure.
    pub fn into_rows(self) -> Vec<ResultRow> {
        self.value.unwrap_or_default()
    }
}
