//! Shared data models for all crates.

pub mod audit;
pub mod connection;
pub mod query;

// Re-export commonly used types
pub use audit::{AuditRecord, OperationKind};
pub use connection::{ConnectionConfig, ConnectionOptions, DbType};
pub use query::ResultRow;
