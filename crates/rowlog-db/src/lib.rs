//! # rowlog-db
//!
//! libSQL persistence for the rowlog audit trail.
//!
//! Handles the log tables and everything that touches them:
//! - Migrations and log table shape verification
//! - The registry of audited entity types, populated at startup
//! - The write interceptor that appends one log row per audited write,
//!   inside the same transaction as the write itself
//! - A unit of work running generic insert/update/delete for `Persisted` types
//! - History navigation: entity to logs, log to entity, prior/later records,
//!   deleted entries and two-snapshot diffs
//!
//! Uses the `libsql` crate (C `SQLite` fork) in local mode.

pub mod clock;
pub mod error;
pub mod helpers;
pub mod interceptor;
mod migrations;
pub mod persist;
pub mod registry;
pub mod repos;
pub mod service;
pub mod unit_of_work;

#[cfg(test)]
mod test_support;

pub use migrations::REQUIRED_LOG_COLUMNS;

use error::DatabaseError;
use libsql::Builder;
use rowlog_core::LogTable;
use tokio::sync::{Mutex, MutexGuard};

/// Database handle owning the libSQL database and its connection.
///
/// The connection is shared. A unit of work holds the access lock from
/// `BEGIN` until commit or rollback, and service reads take the same lock.
pub struct AuditDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    access: Mutex<()>,
}

impl AuditDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically, creating the default `audit_log` table.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open_local_with(path, &LogTable::default()).await
    }

    /// Open a local database whose migrations create `log_table` instead of
    /// the default `audit_log`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local_with(path: &str, log_table: &LogTable) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let audit_db = Self {
            db,
            conn,
            access: Mutex::new(()),
        };
        audit_db.run_migrations(log_table).await?;
        tracing::info!(path, log_table = %log_table, "opened audit database");
        Ok(audit_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    ///
    /// Queries issued here bypass the access lock and can see the writes of
    /// an open unit of work.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Wait for exclusive use of the connection.
    pub(crate) async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.access.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> AuditDb {
        AuditDb::open_local(":memory:").await.unwrap()
    }

    async fn table_exists(db: &AuditDb, name: &str) -> bool {
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    #[tokio::test]
    async fn open_local_creates_default_log_table() {
        let db = test_db().await;
        assert!(table_exists(&db, "audit_log").await);
        db.verify_log_table(&LogTable::default()).await.unwrap();
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations(&LogTable::default()).await.unwrap();
    }

    #[tokio::test]
    async fn open_with_named_table_skips_default() {
        let table = LogTable::new("billing_log").unwrap();
        let db = AuditDb::open_local_with(":memory:", &table).await.unwrap();
        assert!(table_exists(&db, "billing_log").await);
        assert!(!table_exists(&db, "audit_log").await);
    }

    #[tokio::test]
    async fn create_additional_log_table() {
        let db = test_db().await;
        let table = LogTable::new("billing_log").unwrap();
        db.create_log_table(&table).await.unwrap();
        assert!(table_exists(&db, "billing_log").await);
        db.verify_log_table(&table).await.unwrap();
    }

    #[tokio::test]
    async fn verify_reports_missing_table() {
        let db = test_db().await;
        let err = db
            .verify_log_table(&LogTable::new("nope_log").unwrap())
            .await
            .unwrap_err();
        match err {
            DatabaseError::LogShape { table, missing } => {
                assert_eq!(table, "nope_log");
                assert_eq!(missing.len(), REQUIRED_LOG_COLUMNS.len());
            }
            other => panic!("expected LogShape, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verify_reports_missing_columns() {
        let db = test_db().await;
        db.conn()
            .execute(
                "CREATE TABLE thin_log (id INTEGER PRIMARY KEY, entity_type TEXT, entity_type_id TEXT, operation TEXT, created_on TEXT)",
                (),
            )
            .await
            .unwrap();

        let err = db
            .verify_log_table(&LogTable::new("thin_log").unwrap())
            .await
            .unwrap_err();
        match err {
            DatabaseError::LogShape { missing, .. } => {
                assert_eq!(missing, vec!["entity_name", "created_by", "data", "extra_data"]);
            }
            other => panic!("expected LogShape, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn log_rows_cannot_be_updated_or_deleted() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO audit_log (entity_type, entity_type_id, entity_name, operation, created_on)
                 VALUES ('mymodel', '1', 'x', 'INSERT', '2024-01-01T00:00:00.000000Z')",
                (),
            )
            .await
            .unwrap();

        let update = db
            .conn()
            .execute("UPDATE audit_log SET entity_name = 'y'", ())
            .await;
        assert!(update.is_err(), "log rows must not be updatable");

        let delete = db.conn().execute("DELETE FROM audit_log", ()).await;
        assert!(delete.is_err(), "log rows must not be deletable");
    }

    #[tokio::test]
    async fn operation_is_a_closed_set() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO audit_log (entity_type, entity_type_id, entity_name, operation, created_on)
                 VALUES ('mymodel', '1', 'x', 'UPSERT', '2024-01-01T00:00:00.000000Z')",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
