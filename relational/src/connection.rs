//! Live relational connection handle.

use std::str::FromStr;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, MySqlConnection, SqliteConnection};

use common::errors::{AppError, AppResult, StatementError};
use common::models::{ConnectionConfig, DbType, ResultRow};

use crate::decode;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecSummary {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Key generated by the statement, when the driver reports one.
    ///
    /// SQLite reports the connection's last inserted rowid for any statement
    /// that changed rows. An INSERT into a `WITHOUT ROWID` table generates no
    /// rowid, so the value is the one left by an earlier insert.
    pub last_insert_id: Option<i64>,
}

/// Single driver connection for one of the supported backends.
pub enum RelationalConnection {
    /// MySQL connection.
    MySQL(MySqlConnection),
    /// SQLite connection.
    SQLite(SqliteConnection),
}

impl std::fmt::Debug for RelationalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RelationalConnection")
            .field(&self.db_type())
            .finish()
    }
}

impl From<MySqlConnection> for RelationalConnection {
    fn from(conn: MySqlConnection) -> Self {
        RelationalConnection::MySQL(conn)
    }
}

impl From<SqliteConnection> for RelationalConnection {
    fn from(conn: SqliteConnection) -> Self {
        RelationalConnection::SQLite(conn)
    }
}

impl RelationalConnection {
    /// Opens a connection, bounded by the configured connect timeout.
    pub async fn open(config: &ConnectionConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.options.connect_timeout_secs);

        let connect = async {
            match config.db_type {
                DbType::MySQL => {
                    let options = mysql_options(config)?;
                    MySqlConnection::connect_with(&options)
                        .await
                        .map(RelationalConnection::MySQL)
                        .map_err(|e| AppError::Connection(e.to_string()))
                }
                DbType::SQLite => {
                    let options = sqlite_options(config)?;
                    SqliteConnection::connect_with(&options)
                        .await
                        .map(RelationalConnection::SQLite)
                        .map_err(|e| AppError::Connection(e.to_string()))
                }
            }
        };

        tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| {
                AppError::Connection(format!(
                    "timed out after {}s connecting to {}",
                    timeout.as_secs(),
                    config.display_url()
                ))
            })?
    }

    /// Backend of this connection.
    pub fn db_type(&self) -> DbType {
        match self {
            RelationalConnection::MySQL(_) => DbType::MySQL,
            RelationalConnection::SQLite(_) => DbType::SQLite,
        }
    }

    /// Runs an INSERT/UPDATE/DELETE statement.
    pub async fn execute(&mut self, sql: &str) -> Result<ExecSummary, StatementError> {
        match self {
            RelationalConnection::MySQL(conn) => {
                let result = sqlx::query(sql)
                    .execute(&mut *conn)
                    .await
                    .map_err(statement_error)?;
                // MySQL reports 0 when the table has no AUTO_INCREMENT column.
                let last_insert_id = Some(result.last_insert_id())
                    .filter(|id| *id > 0)
                    .and_then(|id| i64::try_from(id).ok());
                Ok(ExecSummary {
                    rows_affected: result.rows_affected(),
                    last_insert_id,
                })
            }
            RelationalConnection::SQLite(conn) => {
                let result = sqlx::query(sql)
                    .execute(&mut *conn)
                    .await
                    .map_err(statement_error)?;
                // last_insert_rowid is stale unless this statement inserted rows.
                let last_insert_id =
                    (result.rows_affected() > 0).then(|| result.last_insert_rowid());
                Ok(ExecSummary {
                    rows_affected: result.rows_affected(),
                    last_insert_id,
                })
            }
        }
    }

    /// Runs a SELECT statement and decodes every row.
    pub async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<ResultRow>, StatementError> {
        match self {
            RelationalConnection::MySQL(conn) => {
                let rows = sqlx::query(sql)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(statement_error)?;
                decode::mysql_rows(&rows)
            }
            RelationalConnection::SQLite(conn) => {
                let rows = sqlx::query(sql)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(statement_error)?;
                decode::sqlite_rows(&rows)
            }
        }
    }

    /// Round trip to check the connection is alive.
    pub async fn ping(&mut self) -> Result<(), sqlx::Error> {
        match self {
            RelationalConnection::MySQL(conn) => conn.ping().await,
            RelationalConnection::SQLite(conn) => conn.ping().await,
        }
    }

    /// Graceful shutdown of the connection.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            RelationalConnection::MySQL(conn) => conn.close().await,
            RelationalConnection::SQLite(conn) => conn.close().await,
        }
    }
}

/// Converts a driver error into statement error text.
///
/// Database errors keep only the server message, other errors their display form.
fn statement_error(err: sqlx::Error) -> StatementError {
    match err {
        sqlx::Error::Database(db_err) => StatementError::rejected(db_err.message()),
        other => StatementError::rejected(other.to_string()),
    }
}

fn mysql_options(config: &ConnectionConfig) -> AppResult<MySqlConnectOptions> {
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| AppError::Validation("MySQL requires host".into()))?;
    let database = config
        .database
        .as_deref()
        .ok_or_else(|| AppError::Validation("MySQL requires a database name".into()))?;
    let ssl_mode = if config.options.ssl_enabled {
        MySqlSslMode::Required
    } else {
        MySqlSslMode::Disabled
    };

    let mut options = MySqlConnectOptions::new()
        .host(host)
        .port(config.effective_port().unwrap_or(3306))
        .database(database)
        .username(config.username.as_deref().unwrap_or("root"))
        .ssl_mode(ssl_mode)
        .timezone(Some(config.options.server_timezone.clone()));
    if let Some(password) = config.password.as_deref() {
        options = options.password(password);
    }
    Ok(options)
}

fn sqlite_options(config: &ConnectionConfig) -> AppResult<SqliteConnectOptions> {
    if config.is_in_memory() {
        return SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Connection(e.to_string()));
    }
    let path = config
        .file_path
        .as_deref()
        .ok_or_else(|| AppError::Validation("SQLite requires file_path".into()))?;
    Ok(SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true))
}
