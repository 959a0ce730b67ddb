//! Write interceptor.
//!
//! Invoked by the unit of work after each insert, update or delete, on the
//! connection of the open transaction. Appends exactly one log row per write
//! of a registered, non-manual entity type, so the log row commits or rolls
//! back together with the change it describes.

use rowlog_core::{AuditContext, AuditLogRecord, Audited, LogTable, NewLogEntry, Operation};

use crate::clock::MonotonicClock;
use crate::error::DatabaseError;
use crate::registry::AuditRegistry;
use crate::repos::audit_log::insert_log;

/// A captured log row and the table it goes to.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLog {
    pub table: LogTable,
    pub entry: NewLogEntry,
}

#[derive(Debug, Default)]
pub struct AuditInterceptor {
    registry: AuditRegistry,
    clock: MonotonicClock,
}

impl AuditInterceptor {
    #[must_use]
    pub fn new(registry: AuditRegistry) -> Self {
        Self {
            registry,
            clock: MonotonicClock::new(),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &AuditRegistry {
        &self.registry
    }

    pub const fn registry_mut(&mut self) -> &mut AuditRegistry {
        &mut self.registry
    }

    /// Build the log row for a write without touching the database.
    ///
    /// Returns `Ok(None)` for entity types in manual mode.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotRegistered` for unregistered types and
    /// `DatabaseError::Snapshot` if the column snapshot fails.
    pub fn entry_for<E: Audited>(
        &self,
        operation: Operation,
        entity: &E,
        ctx: &AuditContext,
    ) -> Result<Option<PendingLog>, DatabaseError> {
        let registration = self.registry.lookup::<E>()?;
        if registration.manual {
            return Ok(None);
        }

        let entry = NewLogEntry::capture(operation, entity, ctx, self.clock.now())?;
        Ok(Some(PendingLog {
            table: registration.log_table.clone(),
            entry,
        }))
    }

    /// Append the log row for a write through `conn`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::entry_for`] or the INSERT. The caller
    /// must roll back the enclosing transaction.
    pub async fn after_write<E: Audited>(
        &self,
        conn: &libsql::Connection,
        operation: Operation,
        entity: &E,
        ctx: &AuditContext,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let Some(pending) = self.entry_for(operation, entity, ctx)? else {
            tracing::trace!(entity_type = E::ENTITY_TYPE, "manual audit mode, skipping");
            return Ok(None);
        };

        let record = insert_log(conn, &pending.table, pending.entry).await?;
        tracing::debug!(
            table = %pending.table,
            entity_type = %record.entity_type,
            entity_type_id = %record.entity_type_id,
            operation = %record.operation,
            log_id = record.id,
            "appended audit log row"
        );
        Ok(Some(record))
    }
}
