//! Audit record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of statement executed through the facade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl OperationKind {
    /// Upper-case name as persisted in the audit store.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "INSERT",
            OperationKind::Update => "UPDATE",
            OperationKind::Delete => "DELETE",
            OperationKind::Select => "SELECT",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry per executed statement.
///
/// Serializes to the persisted document layout:
/// `{timestamp, operation, query, success, affectedRows, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// When the statement finished.
    pub timestamp: DateTime<Utc>,
    /// Statement kind.
    pub operation: OperationKind,
    /// Statement text as submitted.
    pub query: String,
    /// Whether the statement succeeded.
    pub success: bool,
    /// Affected rows, returned rows, or 1/0 for generated keys.
    pub affected_rows: i64,
    /// Driver error text, only present when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Builds a record stamped with the current time.
    ///
    /// Empty error text is dropped so the persisted document never carries
    /// an empty `error` field.
    pub fn new(
        operation: OperationKind,
        query: impl Into<String>,
        success: bool,
        affected_rows: i64,
        error: Option<&str>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            query: query.into(),
            success,
            affected_rows,
            error: error.filter(|e| !e.is_empty()).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_persisted_field_names() {
        let record = AuditRecord::new(OperationKind::Insert, "INSERT INTO t VALUES (1)", true, 1, None);
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["operation"], "INSERT");
        assert_eq!(obj["query"], "INSERT INTO t VALUES (1)");
        assert_eq!(obj["success"], true);
        assert_eq!(obj["affectedRows"], 1);
        assert!(obj.contains_key("timestamp"));
        assert!(!obj.contains_key("error"));
    }

    #[test]
    fn test_empty_error_is_dropped() {
        let record = AuditRecord::new(OperationKind::Delete, "DELETE FROM t", false, 0, Some(""));
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_error_text_is_kept() {
        let record = AuditRecord::new(
            OperationKind::Update,
            "UPDATE t SET x = 1",
            false,
            0,
            Some("no such table: t"),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["error"], "no such table: t");
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Select.to_string(), "SELECT");
        assert_eq!(
            serde_json::from_str::<OperationKind>("\"UPDATE\"").unwrap(),
            OperationKind::Update
        );
    }
}
