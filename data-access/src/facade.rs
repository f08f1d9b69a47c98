//! 数据访问门面模块

use std::time::Instant;

use audit_log::AuditLogger;
use common::config::{AppConfig, AuditConfig};
use common::errors::{AppError, AppResult, StatementError};
use common::models::{ConnectionConfig, OperationKind, ResultRow};
use common::outcome::{OperationResult, FAILURE_SENTINEL};
use relational::{ConnectionManager, RelationalConnection};

/// Executes statements against the relational store and audits each one.
///
/// Every verb takes `&mut self`: one facade serves one caller at a time.
/// Failures never come back as `Err`; they are reported inside the
/// returned `OperationResult` and in the audit trail.
///
/// Each verb asks the manager for a live connection, so a lazily built
/// manager opens on first use and a dropped connection is replaced. After
/// `close()` the facade stays closed.
#[derive(Debug)]
pub struct DataAccessFacade {
    manager: ConnectionManager,
    audit: Option<AuditLogger>,
    closed: bool,
}

impl DataAccessFacade {
    /// Opens the relational connection and, optionally, the audit logger.
    ///
    /// # Errors
    /// Returns `AppError::Connection` (or `AppError::Validation`) when the
    /// relational store cannot be opened. An unreachable audit store only
    /// disables audit logging.
    pub async fn connect(
        relational: ConnectionConfig,
        audit: Option<&AuditConfig>,
    ) -> AppResult<Self> {
        let manager = ConnectionManager::open(relational).await?;
        let audit = match audit {
            Some(config) => Some(AuditLogger::open(config).await),
            None => None,
        };
        Ok(Self {
            manager,
            audit,
            closed: false,
        })
    }

    /// Opens both stores from a loaded `AppConfig`.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::connect(config.relational.clone(), config.audit.as_ref()).await
    }

    /// Wraps an existing connection, without audit logging.
    pub fn new(conn: impl Into<RelationalConnection>) -> Self {
        Self::with_manager(ConnectionManager::adopt(conn))
    }

    /// Wraps a connection manager, without audit logging.
    pub fn with_manager(manager: ConnectionManager) -> Self {
        Self {
            manager,
            audit: None,
            closed: false,
        }
    }

    /// Attaches an audit logger.
    pub fn with_audit_logger(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Replaces the audit logger.
    pub fn set_audit_logger(&mut self, logger: AuditLogger) {
        self.audit = Some(logger);
    }

    /// Detaches the audit logger and hands it back.
    pub fn clear_audit_logger(&mut self) -> Option<AuditLogger> {
        self.audit.take()
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Runs an INSERT and returns the affected-row count.
    pub async fn insert(&mut self, sql: &str) -> OperationResult<u64> {
        self.write(OperationKind::Insert, sql).await
    }

    /// Runs an INSERT and returns the key generated for the new row.
    ///
    /// Fails with `StatementError::NoGeneratedKey` when the statement ran but
    /// the driver reported no key. The audit metric is 1 when a key was
    /// obtained, 0 otherwise.
    pub async fn insert_get_id(&mut self, sql: &str) -> OperationResult<i64> {
        let started = Instant::now();
        let result = match self.connection().await {
            Ok(conn) => conn.execute(sql).await.and_then(|summary| {
                match summary.last_insert_id {
                    Some(id) if summary.rows_affected > 0 => Ok(id),
                    _ => Err(StatementError::NoGeneratedKey {
                        rows_affected: summary.rows_affected,
                    }),
                }
            }),
            Err(e) => Err(e),
        };

        let outcome = finish(OperationKind::Insert, started, result);
        let metric = i64::from(outcome.success);
        self.record_outcome(sql, &outcome, metric).await;
        outcome
    }

    /// Runs an UPDATE and returns the affected-row count.
    pub async fn update(&mut self, sql: &str) -> OperationResult<u64> {
        self.write(OperationKind::Update, sql).await
    }

    /// Runs a DELETE and returns the affected-row count.
    pub async fn delete(&mut self, sql: &str) -> OperationResult<u64> {
        self.write(OperationKind::Delete, sql).await
    }

    /// Runs a SELECT and returns the rows in driver order.
    pub async fn select(&mut self, sql: &str) -> OperationResult<Vec<ResultRow>> {
        let started = Instant::now();
        let result = match self.connection().await {
            Ok(conn) => conn.fetch_rows(sql).await,
            Err(e) => Err(e),
        };

        let outcome = finish(OperationKind::Select, started, result);
        let metric = clamp_count(outcome.row_count() as u64);
        self.record_outcome(sql, &outcome, metric).await;
        outcome
    }

    /// Whether the relational connection is alive. Never fails.
    pub async fn is_connected(&mut self) -> bool {
        self.manager.is_connected().await
    }

    /// Closes the relational connection and the audit logger. Idempotent.
    ///
    /// Statements issued afterwards fail with `StatementError::NotConnected`.
    pub async fn close(&mut self) {
        self.closed = true;
        self.manager.close().await;
        if let Some(logger) = self.audit.as_mut() {
            logger.close().await;
        }
    }

    async fn write(&mut self, operation: OperationKind, sql: &str) -> OperationResult<u64> {
        let started = Instant::now();
        let result = match self.connection().await {
            Ok(conn) => conn.execute(sql).await.map(|summary| summary.rows_affected),
            Err(e) => Err(e),
        };

        let outcome = finish(operation, started, result);
        // Failed inserts log 0; failed updates and deletes log the sentinel.
        let metric = match outcome.value {
            Some(rows) => clamp_count(rows),
            None if operation == OperationKind::Insert => 0,
            None => FAILURE_SENTINEL,
        };
        self.record_outcome(sql, &outcome, metric).await;
        outcome
    }

    /// Live connection for the next statement, opened or replaced on demand.
    async fn connection(&mut self) -> Result<&mut RelationalConnection, StatementError> {
        if self.closed {
            return Err(StatementError::NotConnected);
        }
        self.manager.connect().await.map_err(|e| match e {
            AppError::Statement(inner) => inner,
            AppError::Connection(message) => {
                tracing::warn!(error = %message, "Relational store unavailable");
                StatementError::NotConnected
            }
            other => StatementError::rejected(other.to_string()),
        })
    }

    async fn record_outcome<T>(&self, sql: &str, outcome: &OperationResult<T>, metric: i64) {
        if let Some(logger) = &self.audit {
            logger
                .record(
                    outcome.meta.operation,
                    sql,
                    outcome.success,
                    metric,
                    outcome.error_text().as_deref(),
                )
                .await;
        }
    }
}

fn finish<T>(
    operation: OperationKind,
    started: Instant,
    result: Result<T, StatementError>,
) -> OperationResult<T> {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(value) => {
            tracing::debug!(operation = %operation, duration_ms = elapsed_ms, "Statement executed");
            OperationResult::ok(operation, value).with_duration(elapsed_ms)
        }
        Err(e) => {
            tracing::warn!(operation = %operation, error = %e, "Statement failed");
            OperationResult::failed(operation, e).with_duration(elapsed_ms)
        }
    }
}

fn clamp_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
