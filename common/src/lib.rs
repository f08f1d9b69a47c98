//! Shared building blocks for the audited data access crates.
//!
//! - `config`: environment-driven configuration for both stores
//! - `errors`: the error taxonomy and `AppResult`
//! - `models`: connection settings, audit records and result rows
//! - `outcome`: the per-operation result wrapper returned by the facade
//! - `telemetry`: tracing subscriber bootstrap for host applications

pub mod config;
pub mod errors;
pub mod models;
pub mod outcome;
pub mod telemetry;

pub use errors::{AppError, AppResult, StatementError};
