//! Configuration loading.
//!
//! Settings come from environment variables, after an optional `.env` file
//! in the working directory has been loaded. Variables already present in the
//! environment win over the file.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::connection::{
    ConnectionConfig, ConnectionOptions, DbType, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_SERVER_TIMEZONE,
};
use crate::telemetry::LogFormat;

/// Default MongoDB server selection timeout.
pub const DEFAULT_SERVER_SELECTION_TIMEOUT_MS: u64 = 5_000;

/// Default upper bound for a single audit write.
pub const DEFAULT_AUDIT_WRITE_TIMEOUT_MS: u64 = 5_000;

/// Audit store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct AuditConfig {
    /// MongoDB connection string.
    #[validate(length(min = 1, message = "audit connection string is required"))]
    pub connection_string: String,
    /// Logical database holding the audit collection.
    #[validate(length(min = 1, message = "audit database name is required"))]
    pub database: String,
    /// Collection receiving one document per statement.
    #[validate(length(min = 1, message = "audit collection name is required"))]
    pub collection: String,
    /// How long to wait for a reachable server when opening and writing.
    #[serde(default = "default_server_selection_timeout_ms")]
    #[validate(range(min = 1))]
    pub server_selection_timeout_ms: u64,
    /// Upper bound for one audit write, after which it is abandoned.
    #[serde(default = "default_write_timeout_ms")]
    #[validate(range(min = 1))]
    pub write_timeout_ms: u64,
}

fn default_server_selection_timeout_ms() -> u64 {
    DEFAULT_SERVER_SELECTION_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_AUDIT_WRITE_TIMEOUT_MS
}

impl AuditConfig {
    /// Audit settings from a connection string, database and collection.
    pub fn new(
        connection_string: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            database: database.into(),
            collection: collection.into(),
            server_selection_timeout_ms: DEFAULT_SERVER_SELECTION_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_AUDIT_WRITE_TIMEOUT_MS,
        }
    }

    /// Overrides the server selection timeout.
    pub fn with_server_selection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.server_selection_timeout_ms = timeout_ms;
        self
    }

    /// Overrides the write timeout.
    pub fn with_write_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.write_timeout_ms = timeout_ms;
        self
    }
}

/// Complete configuration of the data access layer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Relational store.
    pub relational: ConnectionConfig,
    /// Audit store; `None` disables audit logging.
    pub audit: Option<AuditConfig>,
    /// Log output format for `telemetry::init_tracing`.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn load() -> AppResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let db_type: DbType = match get("DB_TYPE") {
            Some(v) => v.parse().map_err(AppError::Config)?,
            None => DbType::MySQL,
        };

        let options = ConnectionOptions {
            ssl_enabled: match get("DB_SSL") {
                Some(v) => parse_bool("DB_SSL", &v)?,
                None => false,
            },
            server_timezone: get("DB_TIMEZONE").unwrap_or_else(|| DEFAULT_SERVER_TIMEZONE.into()),
            connect_timeout_secs: parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                get("DB_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };

        let port = get("DB_PORT")
            .map(|v| parse_value::<u16>("DB_PORT", &v))
            .transpose()?
            .or_else(|| db_type.default_port());

        let relational = ConnectionConfig {
            db_type,
            host: get("DB_HOST"),
            port,
            username: get("DB_USER"),
            password: get("DB_PASSWORD"),
            database: get("DB_NAME"),
            file_path: get("DB_FILE"),
            options,
        };
        relational.validate()?;

        let audit = match get("AUDIT_MONGO_URI") {
            Some(uri) => {
                let audit = AuditConfig {
                    connection_string: uri,
                    database: get("AUDIT_DATABASE").unwrap_or_else(|| "audit".into()),
                    collection: get("AUDIT_COLLECTION").unwrap_or_else(|| "transactions".into()),
                    server_selection_timeout_ms: parse_or(
                        "AUDIT_SERVER_SELECTION_TIMEOUT_MS",
                        get("AUDIT_SERVER_SELECTION_TIMEOUT_MS"),
                        DEFAULT_SERVER_SELECTION_TIMEOUT_MS,
                    )?,
                    write_timeout_ms: parse_or(
                        "AUDIT_WRITE_TIMEOUT_MS",
                        get("AUDIT_WRITE_TIMEOUT_MS"),
                        DEFAULT_AUDIT_WRITE_TIMEOUT_MS,
                    )?,
                };
                audit.validate()?;
                Some(audit)
            }
            None => None,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            relational,
            audit,
            log_format,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("invalid value for {key}: {value}")))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    match value {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("invalid boolean for {key}: {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_mysql_from_lookup() -> anyhow::Result<()> {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "db.internal"),
            ("DB_NAME", "shop"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "secret"),
            ("DB_SSL", "true"),
            ("DB_TIMEZONE", "UTC"),
        ]))?;

        let rel = &config.relational;
        assert_eq!(rel.db_type, DbType::MySQL);
        assert_eq!(rel.host.as_deref(), Some("db.internal"));
        assert_eq!(rel.port, Some(3306));
        assert_eq!(rel.password.as_deref(), Some("secret"));
        assert!(rel.options.ssl_enabled);
        assert_eq!(rel.options.server_timezone, "UTC");
        assert!(config.audit.is_none());
        Ok(())
    }

    #[test]
    fn test_sqlite_with_audit_defaults() -> anyhow::Result<()> {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_TYPE", "sqlite"),
            ("DB_FILE", ":memory:"),
            ("AUDIT_MONGO_URI", "mongodb://localhost:27017"),
        ]))?;

        assert!(config.relational.is_in_memory());
        let audit = config.audit.expect("audit configured");
        assert_eq!(audit.database, "audit");
        assert_eq!(audit.collection, "transactions");
        assert_eq!(audit.write_timeout_ms, DEFAULT_AUDIT_WRITE_TIMEOUT_MS);
        Ok(())
    }

    #[test]
    fn test_missing_host_is_validation_error() {
        let err = AppConfig::from_lookup(lookup(&[("DB_NAME", "shop")])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "h"),
            ("DB_NAME", "d"),
            ("DB_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("DB_PORT")));
    }

    #[test]
    fn test_invalid_bool_is_config_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "h"),
            ("DB_NAME", "d"),
            ("DB_SSL", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_blank_values_are_ignored() -> anyhow::Result<()> {
        let config = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "h"),
            ("DB_NAME", "d"),
            ("AUDIT_MONGO_URI", "  "),
        ]))?;
        assert!(config.audit.is_none());
        Ok(())
    }

    #[test]
    fn test_audit_config_builders() {
        let audit = AuditConfig::new("mongodb://x", "db", "coll")
            .with_server_selection_timeout_ms(250)
            .with_write_timeout_ms(100);
        assert_eq!(audit.server_selection_timeout_ms, 250);
        assert_eq!(audit.write_timeout_ms, 100);
        assert!(audit.validate().is_ok());
        assert!(AuditConfig::new("", "db", "coll").validate().is_err());
    }
}
