//! 关系型数据库连接管理
//!
//! 提供以下功能：
//! - 单连接的打开、存活检测与关闭（`ConnectionManager`）
//! - 语句执行与结果行解码（`RelationalConnection`）

pub mod connection;
mod decode;
pub mod manager;

pub use connection::{ExecSummary, RelationalConnection};
pub use manager::ConnectionManager;
