//! Query result models.

use indexmap::IndexMap;
use serde_json::Value;

/// One row returned by a SELECT, keyed by column name in driver column order.
///
/// Serializes to a JSON object that keeps the column order.
pub type ResultRow = IndexMap<String, Value>;
