//! Database error types for rowlog-db.

use rowlog_core::errors::{CoreError, SnapshotError};
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A requested record does not exist.
    #[error("{what} {id} not found")]
    NotFound { what: String, id: String },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Audit setup is inconsistent. Raised at startup, never at write time.
    #[error("Audit configuration error: {0}")]
    Config(String),

    /// A log table does not have the audit log record shape.
    #[error("Log table '{table}' is missing required columns: {}", missing.join(", "))]
    LogShape { table: String, missing: Vec<String> },

    /// A write was attempted for an entity type that was never registered.
    #[error("Entity type '{0}' is not registered for auditing")]
    NotRegistered(String),

    /// The entity snapshot could not be produced; the write is aborted.
    #[error("Snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether this is a lookup miss rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoResult)
    }
}
