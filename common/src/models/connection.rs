//! Connection configuration models.
//!
//! Contains the settings used to open the relational connection.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Default MySQL session time zone (UTC).
pub const DEFAULT_SERVER_TIMEZONE: &str = "+00:00";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Relational backend enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL database.
    MySQL,
    /// SQLite database.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL => Some(3306),
            DbType::SQLite => None,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            "sqlite" => Ok(DbType::SQLite),
            other => Err(format!("unsupported database type: {other}")),
        }
    }
}

/// Driver options recognized for the relational connection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Negotiate TLS with the server.
    #[serde(default)]
    pub ssl_enabled: bool,
    /// Session time zone, e.g. `+00:00` or `Europe/Madrid`.
    #[serde(default = "default_server_timezone")]
    #[validate(length(min = 1, message = "server timezone must not be empty"))]
    pub server_timezone: String,
    /// Upper bound for establishing the connection.
    #[serde(default = "default_connect_timeout_secs")]
    #[validate(range(min = 1, message = "connect timeout must be at least 1 second"))]
    pub connect_timeout_secs: u64,
}

fn default_server_timezone() -> String {
    DEFAULT_SERVER_TIMEZONE.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            ssl_enabled: false,
            server_timezone: default_server_timezone(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Full relational connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_backend_fields"))]
pub struct ConnectionConfig {
    /// Database type.
    pub db_type: DbType,
    /// Database host (for network databases).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port (for network databases).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Database password (never serialized).
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// SQLite file path, or `:memory:`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Driver options.
    #[serde(default)]
    #[validate(nested)]
    pub options: ConnectionOptions,
}

fn validate_backend_fields(config: &ConnectionConfig) -> Result<(), ValidationError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    match config.db_type {
        DbType::MySQL if !present(&config.host) => {
            Err(ValidationError::new("mysql_host").with_message("MySQL requires host".into()))
        }
        DbType::MySQL if !present(&config.database) => Err(ValidationError::new("mysql_database")
            .with_message("MySQL requires a database name".into())),
        DbType::SQLite if !present(&config.file_path) => {
            Err(ValidationError::new("sqlite_path").with_message("SQLite requires file_path".into()))
        }
        _ => Ok(()),
    }
}

impl ConnectionConfig {
    /// MySQL configuration from host, port, database and credentials.
    pub fn mysql(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            db_type: DbType::MySQL,
            host: Some(host.into()),
            port: Some(port),
            username: Some(username.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            file_path: None,
            options: ConnectionOptions::default(),
        }
    }

    /// SQLite configuration for a database file (created if missing).
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            db_type: DbType::SQLite,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            file_path: Some(path.into()),
            options: ConnectionOptions::default(),
        }
    }

    /// Private in-memory SQLite database.
    pub fn sqlite_in_memory() -> Self {
        Self::sqlite(":memory:")
    }

    /// Replaces the driver options.
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Port to connect to, falling back to the backend default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.db_type.default_port())
    }

    /// Whether this points at an in-memory SQLite database.
    pub fn is_in_memory(&self) -> bool {
        self.db_type == DbType::SQLite && self.file_path.as_deref() == Some(":memory:")
    }

    /// Short label for diagnostics: database name or file path.
    pub fn target_name(&self) -> &str {
        match self.db_type {
            DbType::MySQL => self.database.as_deref().unwrap_or(""),
            DbType::SQLite => self.file_path.as_deref().unwrap_or(""),
        }
    }

    /// Driver URL for diagnostics. The password is never included.
    pub fn display_url(&self) -> String {
        match self.db_type {
            DbType::MySQL => {
                let user = self.username.as_deref().unwrap_or("root");
                let host = self.host.as_deref().unwrap_or("");
                let port = self.effective_port().unwrap_or(3306);
                let database = self.database.as_deref().unwrap_or("");
                let ssl_mode = if self.options.ssl_enabled {
                    "REQUIRED"
                } else {
                    "DISABLED"
                };
                format!(
                    "mysql://{}@{}:{}/{}?ssl-mode={}&timezone={}",
                    user, host, port, database, ssl_mode, self.options.server_timezone
                )
            }
            DbType::SQLite if self.is_in_memory() => "sqlite::memory:".to_string(),
            DbType::SQLite => format!("sqlite://{}", self.file_path.as_deref().unwrap_or("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_config_is_valid() {
        let config = ConnectionConfig::mysql("localhost", 3306, "shop", "app", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mysql_requires_host() {
        let mut config = ConnectionConfig::mysql("localhost", 3306, "shop", "app", "secret");
        config.host = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mysql_requires_database() {
        let mut config = ConnectionConfig::mysql("localhost", 3306, "shop", "app", "secret");
        config.database = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let mut config = ConnectionConfig::sqlite_in_memory();
        assert!(config.validate().is_ok());
        config.file_path = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_timezone_is_rejected() {
        let config = ConnectionConfig::sqlite_in_memory().with_options(ConnectionOptions {
            server_timezone: String::new(),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_url_omits_password() {
        let config = ConnectionConfig::mysql("db.local", 3307, "shop", "app", "secret");
        let url = config.display_url();
        assert_eq!(
            url,
            "mysql://app@db.local:3307/shop?ssl-mode=DISABLED&timezone=+00:00"
        );
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_display_url_reflects_ssl_option() {
        let config = ConnectionConfig::mysql("db.local", 3306, "shop", "app", "pw").with_options(
            ConnectionOptions {
                ssl_enabled: true,
                server_timezone: "Europe/Madrid".into(),
                ..Default::default()
            },
        );
        assert!(config.display_url().ends_with("?ssl-mode=REQUIRED&timezone=Europe/Madrid"));
    }

    #[test]
    fn test_sqlite_display_url() {
        assert_eq!(ConnectionConfig::sqlite_in_memory().display_url(), "sqlite::memory:");
        assert_eq!(ConnectionConfig::sqlite("data/app.db").display_url(), "sqlite://data/app.db");
    }

    #[test]
    fn test_db_type_parsing() {
        assert_eq!("MySQL".parse::<DbType>(), Ok(DbType::MySQL));
        assert_eq!("sqlite".parse::<DbType>(), Ok(DbType::SQLite));
        assert!("oracle".parse::<DbType>().is_err());
    }

    #[test]
    fn test_effective_port_defaults() {
        let mut config = ConnectionConfig::mysql("h", 3306, "d", "u", "p");
        config.port = None;
        assert_eq!(config.effective_port(), Some(3306));
        assert_eq!(ConnectionConfig::sqlite_in_memory().effective_port(), None);
    }
}
