//! Unit of work: entity writes and their log rows in one transaction.
//!
//! Each write runs its statement, then hands the in-memory entity to the
//! interceptor on the same transaction. Nothing is visible to other readers
//! until [`UnitOfWork::commit`]; [`UnitOfWork::rollback`] discards the data
//! change and its log row together.
//!
//! A unit of work owns the database access lock for its whole life. Other
//! units of work and service reads wait until it commits or rolls back.

use rowlog_core::{AuditContext, AuditLogRecord, Operation};
use tokio::sync::MutexGuard;

use crate::AuditDb;
use crate::error::DatabaseError;
use crate::interceptor::AuditInterceptor;
use crate::persist::{Persisted, Statement, delete_statement, insert_statement, update_statement};

pub struct UnitOfWork<'a> {
    tx: libsql::Transaction,
    ctx: AuditContext,
    interceptor: Option<&'a AuditInterceptor>,
    _access: MutexGuard<'a, ()>,
}

impl<'a> UnitOfWork<'a> {
    /// Wait for the access lock on `db`, then begin a transaction.
    ///
    /// Without an interceptor, writes are plain and no log rows are produced.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be started.
    pub async fn begin(
        db: &'a AuditDb,
        ctx: AuditContext,
        interceptor: Option<&'a AuditInterceptor>,
    ) -> Result<Self, DatabaseError> {
        let access = db.exclusive().await;
        let tx = db.conn().transaction().await?;
        Ok(Self {
            tx,
            ctx,
            interceptor,
            _access: access,
        })
    }

    #[must_use]
    pub const fn context(&self) -> &AuditContext {
        &self.ctx
    }

    /// Insert `entity`, assigning a generated rowid when its key is `Null`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert or its log row fails, and
    /// `DatabaseError::InvalidState` if the entity still has no key after the
    /// insert (its `Persisted::assign_rowid` ignores the generated rowid). The
    /// transaction must then be rolled back.
    pub async fn insert<E: Persisted>(
        &self,
        entity: &mut E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let stmt = insert_statement(entity)?;
        let generated_key = entity
            .column_values()
            .first()
            .is_some_and(rowlog_core::FieldValue::is_null);

        self.run(&stmt).await?;
        if generated_key {
            entity.assign_rowid(self.tx.last_insert_rowid());
        }
        if entity.audit_id().is_empty() {
            return Err(DatabaseError::InvalidState(format!(
                "{} has no key after insert; its log row could not be correlated",
                E::ENTITY_TYPE
            )));
        }

        self.audit(Operation::Insert, entity).await
    }

    /// Update the row of `entity` with its current column values.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no row has the entity's key, in
    /// which case no log row is written.
    pub async fn update<E: Persisted>(
        &self,
        entity: &E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let stmt = update_statement(entity)?;
        if self.run(&stmt).await? == 0 {
            return Err(DatabaseError::NoResult);
        }
        self.audit(Operation::Update, entity).await
    }

    /// Delete the row of `entity`. The log row keeps its last known state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if no row has the entity's key.
    pub async fn delete<E: Persisted>(
        &self,
        entity: &E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let stmt = delete_statement(entity)?;
        if self.run(&stmt).await? == 0 {
            return Err(DatabaseError::NoResult);
        }
        self.audit(Operation::Delete, entity).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn run(&self, stmt: &Statement) -> Result<u64, DatabaseError> {
        let affected = self
            .tx
            .execute(&stmt.sql, libsql::params_from_iter(stmt.params.clone()))
            .await?;
        Ok(affected)
    }

    async fn audit<E: Persisted>(
        &self,
        operation: Operation,
        entity: &E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        match self.interceptor {
            Some(interceptor) => {
                interceptor
                    .after_write(&self.tx, operation, entity, &self.ctx)
                    .await
            }
            None => Ok(None),
        }
    }
}
