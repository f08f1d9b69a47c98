//! Relational connection manager.
//!
//! Owns at most one live connection. Opening is lazy, reconnecting replaces
//! the previous handle, and closing is idempotent.

use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::ConnectionConfig;

use crate::connection::RelationalConnection;

/// Manages the single relational connection of one consumer.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Settings used to (re)open the connection; absent for adopted handles.
    config: Option<ConnectionConfig>,
    /// The live handle, if any.
    conn: Option<RelationalConnection>,
}

impl ConnectionManager {
    /// Creates a manager without opening a connection.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config: Some(config),
            conn: None,
        }
    }

    /// Creates a manager and opens the connection immediately.
    pub async fn open(config: ConnectionConfig) -> AppResult<Self> {
        let mut mgr = Self::new(config);
        mgr.connect().await?;
        Ok(mgr)
    }

    /// Takes ownership of an already open connection.
    ///
    /// The manager has no settings to reopen it once closed.
    pub fn adopt(conn: impl Into<RelationalConnection>) -> Self {
        Self {
            config: None,
            conn: Some(conn.into()),
        }
    }

    /// Configuration this manager connects with.
    pub fn config(&self) -> Option<&ConnectionConfig> {
        self.config.as_ref()
    }

    /// Returns the live connection, opening one if needed.
    ///
    /// A held handle is reused when it answers a ping; a dead one is closed
    /// and replaced.
    pub async fn connect(&mut self) -> AppResult<&mut RelationalConnection> {
        let stale = match self.conn.as_mut() {
            Some(conn) => conn.ping().await.err(),
            None => None,
        };
        if let Some(e) = stale {
            tracing::warn!(error = %e, "Held connection is dead, reconnecting");
            self.close().await;
        }

        if self.conn.is_none() {
            let config = self.config.as_ref().ok_or_else(|| {
                AppError::Connection("no configuration available to reopen the connection".into())
            })?;
            config.validate()?;

            match RelationalConnection::open(config).await {
                Ok(conn) => {
                    tracing::info!(
                        db_type = %config.db_type,
                        target = %config.target_name(),
                        "Relational connection established"
                    );
                    self.conn = Some(conn);
                }
                Err(e) => {
                    tracing::error!(url = %config.display_url(), error = %e, "Relational connection failed");
                    return Err(e);
                }
            }
        }

        self.conn
            .as_mut()
            .ok_or_else(|| AppError::Connection("connection unavailable".into()))
    }

    /// Held connection without any I/O.
    pub fn current(&mut self) -> Option<&mut RelationalConnection> {
        self.conn.as_mut()
    }

    /// Whether a live connection is held. Never fails.
    pub async fn is_connected(&mut self) -> bool {
        match self.conn.as_mut() {
            Some(conn) => conn.ping().await.is_ok(),
            None => false,
        }
    }

    /// Closes the held connection. No-op if none is held.
    pub async fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close().await {
            Ok(()) => tracing::info!("Relational connection closed"),
            Err(e) => tracing::warn!(error = %e, "Relational connection closed with error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};

    #[tokio::test]
    async fn test_new_is_lazy() {
        let mut mgr = ConnectionManager::new(ConnectionConfig::sqlite_in_memory());
        assert!(!mgr.is_connected().await);
        assert!(mgr.current().is_none());

        mgr.connect().await.unwrap();
        assert!(mgr.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_reuses_live_handle() {
        let mut mgr = ConnectionManager::open(ConnectionConfig::sqlite_in_memory())
            .await
            .unwrap();
        mgr.connect()
            .await
            .unwrap()
            .execute("CREATE TABLE t (id INTEGER)")
            .await
            .unwrap();

        // A fresh in-memory database would not have the table.
        let rows = mgr
            .connect()
            .await
            .unwrap()
            .fetch_rows("SELECT COUNT(*) AS n FROM t")
            .await
            .unwrap();
        assert_eq!(rows[0]["n"], 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut mgr = ConnectionManager::open(ConnectionConfig::sqlite_in_memory())
            .await
            .unwrap();
        mgr.close().await;
        assert!(!mgr.is_connected().await);
        mgr.close().await;
        assert!(!mgr.is_connected().await);
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let mut mgr = ConnectionManager::new(ConnectionConfig::sqlite_in_memory());
        mgr.close().await;
        assert!(!mgr.is_connected().await);
    }

    #[tokio::test]
    async fn test_reopen_after_close_replaces_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let config = ConnectionConfig::sqlite(path.to_string_lossy().to_string());

        let mut mgr = ConnectionManager::open(config).await.unwrap();
        mgr.connect()
            .await
            .unwrap()
            .execute("CREATE TABLE t (id INTEGER)")
            .await
            .unwrap();
        mgr.close().await;

        let rows = mgr
            .connect()
            .await
            .unwrap()
            .fetch_rows("SELECT name FROM sqlite_master WHERE type = 'table'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(mgr.is_connected().await);
    }

    #[tokio::test]
    async fn test_adopted_handle_cannot_reopen() {
        let conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        let mut mgr = ConnectionManager::adopt(conn);
        assert!(mgr.is_connected().await);
        assert!(mgr.config().is_none());

        mgr.close().await;
        let err = mgr.connect().await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_connecting() {
        let mut config = ConnectionConfig::sqlite_in_memory();
        config.file_path = None;
        let err = ConnectionManager::open(config).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let mut config = ConnectionConfig::mysql("127.0.0.1", 1, "shop", "app", "pw");
        config.options.connect_timeout_secs = 2;
        let mut mgr = ConnectionManager::new(config);
        let err = mgr.connect().await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)));
        assert!(!mgr.is_connected().await);
    }
}
