//! Audit sink abstraction.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use common::models::AuditRecord;

use crate::error::AuditError;

/// Destination for audit records.
///
/// Object safe so the logger can hold any implementation behind a `Box`.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Releases the underlying resources.
    async fn close(&self) {}

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Sink keeping records in memory.
///
/// Clones share the same buffer, so a caller can keep one clone to inspect
/// what the logger wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
