#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for areas, animal movements, and accounts.
//!
//! Uses `switchy_database` with raw parameterized SQL. The schema is
//! created on open. [`store::SqlStore`] adapts the query functions to the
//! [`chipping_area::AreaStore`] and [`chipping_analytics::MovementStore`]
//! seams.

pub mod db;
pub mod queries;
pub mod store;

use chrono::{DateTime, SecondsFormat, Utc};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Connection setup error.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },

    /// I/O error while preparing the database directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Formats a timestamp for storage.
///
/// Fixed-width microsecond RFC 3339 in UTC, so lexical order of the
/// stored text equals chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid stored timestamp '{value}': {e}"),
        })
}
