//! Database migration runner.
//!
//! Embeds the log table definition at compile time. Every statement uses
//! `IF NOT EXISTS`, so re-running is harmless.

use rowlog_core::LogTable;

use crate::AuditDb;
use crate::error::DatabaseError;

/// Log table definition with a `{table}` placeholder.
const LOG_TABLE_DDL: &str = include_str!("../migrations/001_audit_log.sql");

/// Columns every log table must have, in definition order.
pub const REQUIRED_LOG_COLUMNS: [&str; 9] = [
    "id",
    "entity_type",
    "entity_type_id",
    "entity_name",
    "operation",
    "created_on",
    "created_by",
    "data",
    "extra_data",
];

impl AuditDb {
    /// Run all embedded migrations in sequence, creating `log_table`.
    pub(crate) async fn run_migrations(&self, log_table: &LogTable) -> Result<(), DatabaseError> {
        self.create_log_table(log_table)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_audit_log: {e}")))?;
        tracing::debug!("migrations applied");
        Ok(())
    }

    /// Create a log table with the standard shape, its indexes and its
    /// append-only triggers.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the DDL fails.
    pub async fn create_log_table(&self, table: &LogTable) -> Result<(), DatabaseError> {
        let ddl = LOG_TABLE_DDL.replace("{table}", table.as_str());
        self.conn.execute_batch(&ddl).await?;
        Ok(())
    }

    /// Check that `table` exists and has every column of the log record shape.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LogShape` listing the missing columns (all of
    /// them if the table does not exist).
    pub async fn verify_log_table(&self, table: &LogTable) -> Result<(), DatabaseError> {
        let mut rows = self
            .conn
            .query(&format!("PRAGMA table_info({table})"), ())
            .await?;

        let mut present = Vec::new();
        while let Some(row) = rows.next().await? {
            present.push(row.get::<String>(1)?);
        }

        let missing: Vec<String> = REQUIRED_LOG_COLUMNS
            .iter()
            .filter(|col| !present.iter().any(|p| p == *col))
            .map(ToString::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatabaseError::LogShape {
                table: table.to_string(),
                missing,
            })
        }
    }
}
