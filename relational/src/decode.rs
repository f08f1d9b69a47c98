//! Row decoding into `ResultRow`.
//!
//! Each column is decoded by the runtime type the driver reports for it.
//! Values with no JSON counterpart are rendered as strings: decimals keep
//! their exact text, date/time values use ISO formats and binary data is
//! base64 encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use common::errors::StatementError;
use common::models::ResultRow;

/// Decodes MySQL rows in driver order.
pub(crate) fn mysql_rows(rows: &[MySqlRow]) -> Result<Vec<ResultRow>, StatementError> {
    rows.iter()
        .map(|row| decode_row(row, mysql_value))
        .collect()
}

/// Decodes SQLite rows in driver order.
pub(crate) fn sqlite_rows(rows: &[SqliteRow]) -> Result<Vec<ResultRow>, StatementError> {
    rows.iter()
        .map(|row| decode_row(row, sqlite_value))
        .collect()
}

fn decode_row<R, F>(row: &R, decode: F) -> Result<ResultRow, StatementError>
where
    R: Row,
    F: Fn(&R, usize) -> Result<Value, sqlx::Error>,
{
    let mut out = ResultRow::with_capacity(row.columns().len());
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode(row, i).map_err(|e| StatementError::Decode {
            column: column.name().to_string(),
            message: e.to_string(),
        })?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn mysql_value(row: &MySqlRow, idx: usize) -> Result<Value, sqlx::Error> {
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let name = raw.type_info().name().to_ascii_uppercase();
        name
    };

    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::from(row.try_get_unchecked::<u64, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::from(row.try_get_unchecked::<i64, _>(idx)?)
        }
        "FLOAT" | "DOUBLE" => float_value(row.try_get_unchecked::<f64, _>(idx)?),
        "DECIMAL" => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        "DATETIME" => Value::String(row.try_get_unchecked::<NaiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMP" => Value::String(row.try_get_unchecked::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        "DATE" => Value::String(row.try_get_unchecked::<NaiveDate, _>(idx)?.to_string()),
        // TIME can exceed 24h or be negative; fall back to the raw text then.
        "TIME" => match row.try_get_unchecked::<NaiveTime, _>(idx) {
            Ok(t) => Value::String(t.to_string()),
            Err(_) => text_or_bytes(row, idx)?,
        },
        "JSON" => row.try_get_unchecked::<Value, _>(idx)?,
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT"
        | "GEOMETRY" => bytes_value(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => text_or_bytes(row, idx)?,
    };
    Ok(value)
}

fn sqlite_value(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    // SQLite reports the storage class of the value itself, not the declared type.
    let type_name = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let name = raw.type_info().name().to_ascii_uppercase();
        name
    };

    let value = match type_name.as_str() {
        "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" => float_value(row.try_get_unchecked::<f64, _>(idx)?),
        "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
        "BLOB" => bytes_value(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => text_or_bytes(row, idx)?,
    };
    Ok(value)
}

fn text_or_bytes<'r, R>(row: &'r R, idx: usize) -> Result<Value, sqlx::Error>
where
    R: Row,
    usize: sqlx::ColumnIndex<R>,
    String: sqlx::Decode<'r, R::Database>,
    Vec<u8>: sqlx::Decode<'r, R::Database>,
{
    match row.try_get_unchecked::<String, _>(idx) {
        Ok(s) => Ok(Value::String(s)),
        Err(_) => Ok(bytes_value(row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::String(STANDARD.encode(bytes))
}
