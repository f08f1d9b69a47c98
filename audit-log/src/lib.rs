//! SQL 操作审计日志
//!
//! 每条执行过的语句对应审计存储中的一条文档。审计写入失败只记录告警，
//! 不影响主操作的结果。

pub mod error;
pub mod logger;
pub mod mongo;
pub mod sink;

pub use error::AuditError;
pub use logger::AuditLogger;
pub use mongo::{audit_document, MongoAuditSink};
pub use sink::{AuditSink, MemoryAuditSink};
