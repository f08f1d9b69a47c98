//! 带审计日志的数据访问门面
//!
//! `DataAccessFacade` runs INSERT/UPDATE/DELETE/SELECT statements on a
//! relational connection and writes one audit record per statement.
//!
//! ```no_run
//! use data_access::{AuditConfig, ConnectionConfig, DataAccessFacade};
//!
//! # async fn run() -> data_access::AppResult<()> {
//! let relational = ConnectionConfig::mysql("localhost", 3306, "shop", "app", "secret");
//! let audit = AuditConfig::new("mongodb://localhost:27017", "audit", "transactions");
//!
//! let mut facade = DataAccessFacade::connect(relational, Some(&audit)).await?;
//! let id = facade.insert_get_id("INSERT INTO t (name) VALUES ('x')").await;
//! if let Some(id) = id.value() {
//!     let rows = facade.select(&format!("SELECT * FROM t WHERE id = {id}")).await;
//!     println!("{} row(s)", rows.row_count());
//! }
//! facade.close().await;
//! # Ok(())
//! # }
//! ```

pub mod facade;

pub use audit_log::{AuditError, AuditLogger, AuditSink, MemoryAuditSink, MongoAuditSink};
pub use common::config::{AppConfig, AuditConfig};
pub use common::errors::{AppError, AppResult, StatementError};
pub use common::models::{AuditRecord, ConnectionConfig, ConnectionOptions, DbType, OperationKind, ResultRow};
pub use common::outcome::{OperationResult, FAILURE_SENTINEL};
pub use facade::DataAccessFacade;
pub use relational::{ConnectionManager, ExecSummary, RelationalConnection};
