//! Audit logger.
//!
//! Wraps an optional sink. Every failure is logged through `tracing` and
//! dropped: the statement that triggered the record has already run and its
//! result must not depend on the audit store.

use std::time::Duration;

use validator::Validate;

use common::config::{AuditConfig, DEFAULT_AUDIT_WRITE_TIMEOUT_MS};
use common::models::{AuditRecord, OperationKind};

use crate::error::AuditError;
use crate::mongo::MongoAuditSink;
use crate::sink::AuditSink;

/// Appends one audit record per executed statement.
pub struct AuditLogger {
    sink: Option<Box<dyn AuditSink>>,
    write_timeout: Duration,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("sink", &self.sink.as_ref().map(|s| s.name()))
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

impl AuditLogger {
    /// Opens a MongoDB-backed logger.
    ///
    /// Returns a disabled logger when the audit store is unreachable or the
    /// configuration is invalid.
    pub async fn open(config: &AuditConfig) -> Self {
        match Self::try_open(config).await {
            Ok(logger) => logger,
            Err(e) => {
                tracing::warn!(
                    database = %config.database,
                    collection = %config.collection,
                    error = %e,
                    "Audit store unavailable, audit logging disabled"
                );
                Self::disabled()
            }
        }
    }

    /// Opens a MongoDB-backed logger, reporting why it could not.
    pub async fn try_open(config: &AuditConfig) -> Result<Self, AuditError> {
        config
            .validate()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?;
        let sink = MongoAuditSink::connect(config).await?;
        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Audit store connected"
        );
        Ok(Self::with_sink(sink).with_write_timeout(Duration::from_millis(config.write_timeout_ms)))
    }

    /// Logger writing to the given sink.
    pub fn with_sink(sink: impl AuditSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            write_timeout: Duration::from_millis(DEFAULT_AUDIT_WRITE_TIMEOUT_MS),
        }
    }

    /// Logger that records nothing.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            write_timeout: Duration::from_millis(DEFAULT_AUDIT_WRITE_TIMEOUT_MS),
        }
    }

    /// Sets the upper bound for one append.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Records the outcome of one statement.
    pub async fn record(
        &self,
        operation: OperationKind,
        query: &str,
        success: bool,
        row_count: i64,
        error: Option<&str>,
    ) {
        if self.sink.is_none() {
            return;
        }
        let record = AuditRecord::new(operation, query, success, row_count, error);
        self.append(&record).await;
    }

    /// Appends a prepared record. Failures are logged and dropped.
    pub async fn append(&self, record: &AuditRecord) {
        let Some(sink) = self.sink.as_deref() else {
            return;
        };

        let result = match tokio::time::timeout(self.write_timeout, sink.append(record)).await {
            Ok(result) => result,
            Err(_) => Err(AuditError::Timeout(self.write_timeout.as_millis() as u64)),
        };

        if let Err(e) = result {
            tracing::warn!(
                sink = sink.name(),
                operation = %record.operation,
                error = %e,
                "Failed to record audit entry"
            );
        }
    }

    /// Releases the sink. Further records are dropped.
    pub async fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close().await;
            tracing::info!(sink = sink.name(), "Audit logger closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::sink::MemoryAuditSink;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Write("collection is read-only".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowSink;

    #[async_trait]
    impl AuditSink for SlowSink {
        async fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_record_appends_to_sink() {
        let sink = MemoryAuditSink::new();
        let logger = AuditLogger::with_sink(sink.clone());

        logger
            .record(OperationKind::Delete, "DELETE FROM t WHERE id = 1", true, 1, None)
            .await;

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, OperationKind::Delete);
        assert_eq!(records[0].affected_rows, 1);
        assert!(records[0].success);
        assert_eq!(records[0].error, None);
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let logger = AuditLogger::with_sink(FailingSink);
        logger
            .record(OperationKind::Insert, "INSERT INTO t VALUES (1)", true, 1, None)
            .await;
        assert!(logger.is_enabled());
    }

    #[tokio::test]
    async fn test_slow_sink_is_abandoned() {
        let logger = AuditLogger::with_sink(SlowSink).with_write_timeout(Duration::from_millis(20));
        let started = std::time::Instant::now();
        logger
            .record(OperationKind::Select, "SELECT 1", true, 1, None)
            .await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_disabled_logger_is_noop() {
        let mut logger = AuditLogger::disabled();
        assert!(!logger.is_enabled());
        logger
            .record(OperationKind::Update, "UPDATE t SET a = 1", false, 0, Some("boom"))
            .await;
        logger.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_stops_recording() {
        let sink = MemoryAuditSink::new();
        let mut logger = AuditLogger::with_sink(sink.clone());
        logger.close().await;
        logger.close().await;
        assert!(!logger.is_enabled());

        logger
            .record(OperationKind::Insert, "INSERT INTO t VALUES (1)", true, 1, None)
            .await;
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_open_degrades_when_unreachable() {
        let config = AuditConfig::new("mongodb://127.0.0.1:1", "audit", "transactions")
            .with_server_selection_timeout_ms(200);
        let logger = AuditLogger::open(&config).await;
        assert!(!logger.is_enabled());
    }

    #[tokio::test]
    async fn test_try_open_reports_invalid_config() {
        let config = AuditConfig::new("mongodb://127.0.0.1:1", "", "transactions");
        let err = AuditLogger::try_open(&config).await.unwrap_err();
        assert!(matches!(err, AuditError::Unavailable(_)));
    }
}
