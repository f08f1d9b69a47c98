//! MongoDB audit sink.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use common::config::AuditConfig;
use common::models::AuditRecord;

use crate::error::AuditError;
use crate::sink::AuditSink;

const APP_NAME: &str = "sql-audit";

/// Appends audit records to a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoAuditSink {
    client: Client,
    collection: Collection<Document>,
}

impl MongoAuditSink {
    /// Connects and pings the audit database.
    ///
    /// The driver connects lazily, so the ping is what proves the server is
    /// reachable within the server selection timeout.
    pub async fn connect(config: &AuditConfig) -> Result<Self, AuditError> {
        let mut options = ClientOptions::parse(config.connection_string.as_str())
            .await
            .map_err(|e| AuditError::Unavailable(e.to_string()))?;
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }

        let client =
            Client::with_options(options).map_err(|e| AuditError::Unavailable(e.to_string()))?;
        let database = client.database(&config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AuditError::Unavailable(e.to_string()))?;

        let collection = database.collection::<Document>(&config.collection);
        Ok(Self { client, collection })
    }

    /// Collection the records go to.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl AuditSink for MongoAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.collection.insert_one(audit_document(record)).await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

/// Persisted layout of one audit record.
///
/// `{timestamp: date, operation, query, success, affectedRows, error?}`;
/// `error` is only written when non-empty.
pub fn audit_document(record: &AuditRecord) -> Document {
    let mut document = doc! {
        "timestamp": bson::DateTime::from_millis(record.timestamp.timestamp_millis()),
        "operation": record.operation.as_str(),
        "query": record.query.as_str(),
        "success": record.success,
        "affectedRows": row_count(record.affected_rows),
    };
    if let Some(error) = record.error.as_deref().filter(|e| !e.is_empty()) {
        document.insert("error", error);
    }
    document
}

/// Row counts are stored as 32-bit integers unless they do not fit.
fn row_count(n: i64) -> Bson {
    i32::try_from(n).map(Bson::Int32).unwrap_or(Bson::Int64(n))
}
