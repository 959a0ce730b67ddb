//! Service layer tying the database, the registry and the interceptor together.
//!
//! `AuditService` wraps `AuditDb` (raw database access) and `AuditInterceptor`
//! (log row production). Read-side repo methods are implemented as
//! `impl AuditService` blocks in `repos`.

use rowlog_config::RowlogConfig;
use rowlog_core::{AuditContext, AuditLogRecord, Audited, LogTable};

use crate::AuditDb;
use crate::error::DatabaseError;
use crate::interceptor::AuditInterceptor;
use crate::persist::Persisted;
use crate::registry::AuditRegistry;
use crate::unit_of_work::UnitOfWork;

/// Orchestrates audited writes and history reads.
///
/// Every single-entity write method follows this protocol:
/// 1. Begin transaction
/// 2. Execute the entity statement
/// 3. Append the log row (inside the transaction)
/// 4. Commit, or roll back if any step failed
pub struct AuditService {
    db: AuditDb,
    interceptor: AuditInterceptor,
    default_table: LogTable,
}

impl AuditService {
    /// Create a service from loaded configuration.
    ///
    /// The configured log table is created if it does not exist yet. The
    /// default `audit_log` table is only created when it is the configured one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the log
    /// table name is invalid.
    pub async fn from_config(config: &RowlogConfig) -> Result<Self, DatabaseError> {
        let table = LogTable::new(config.audit.log_table.as_str())?;
        let db = AuditDb::open_local_with(&config.database.path, &table).await?;
        let mut service = Self::from_db(db);
        service.default_table = table;
        Ok(service)
    }

    /// Create from an existing `AuditDb` (for testing).
    #[must_use]
    pub fn from_db(db: AuditDb) -> Self {
        Self {
            db,
            interceptor: AuditInterceptor::new(AuditRegistry::new()),
            default_table: LogTable::default(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &AuditDb {
        &self.db
    }

    #[must_use]
    pub const fn registry(&self) -> &AuditRegistry {
        self.interceptor.registry()
    }

    #[must_use]
    pub const fn interceptor(&self) -> &AuditInterceptor {
        &self.interceptor
    }

    /// Log table used when a caller does not name one.
    #[must_use]
    pub const fn default_table(&self) -> &LogTable {
        &self.default_table
    }

    /// Register `E` for auditing. Call once per entity type at startup.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LogShape` if `E`'s log table does not have the
    /// log record shape, or `DatabaseError::Config` for conflicting
    /// registrations. Both are fatal configuration errors.
    pub async fn register<E: Audited>(&mut self) -> Result<(), DatabaseError> {
        let table = E::log_table();
        self.db.verify_log_table(&table).await?;
        self.interceptor.registry_mut().insert::<E>()?;
        tracing::info!(
            entity_type = E::ENTITY_TYPE,
            log_table = %table,
            manual = E::manage_audit_manually(),
            "registered audited entity type"
        );
        Ok(())
    }

    /// Begin a unit of work whose writes are audited.
    ///
    /// Waits while another unit of work is open. Until this one commits or
    /// rolls back, service reads wait for it too, so do not await them from
    /// the task holding it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be started.
    pub async fn begin(&self, ctx: AuditContext) -> Result<UnitOfWork<'_>, DatabaseError> {
        UnitOfWork::begin(&self.db, ctx, Some(&self.interceptor)).await
    }

    /// Insert `entity` and its log row atomically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if either write fails; nothing is persisted.
    pub async fn insert<E: Persisted>(
        &self,
        ctx: &AuditContext,
        entity: &mut E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let uow = self.begin(ctx.clone()).await?;
        let result = uow.insert(entity).await;
        Self::finish(uow, result, E::ENTITY_TYPE).await
    }

    /// Update `entity` and append its log row atomically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if either write fails; nothing is persisted.
    pub async fn update<E: Persisted>(
        &self,
        ctx: &AuditContext,
        entity: &E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let uow = self.begin(ctx.clone()).await?;
        let result = uow.update(entity).await;
        Self::finish(uow, result, E::ENTITY_TYPE).await
    }

    /// Delete `entity` and append its log row atomically. Earlier log rows
    /// are untouched.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if either write fails; nothing is persisted.
    pub async fn delete<E: Persisted>(
        &self,
        ctx: &AuditContext,
        entity: &E,
    ) -> Result<Option<AuditLogRecord>, DatabaseError> {
        let uow = self.begin(ctx.clone()).await?;
        let result = uow.delete(entity).await;
        Self::finish(uow, result, E::ENTITY_TYPE).await
    }

    async fn finish<T>(
        uow: UnitOfWork<'_>,
        result: Result<T, DatabaseError>,
        entity_type: &str,
    ) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(entity_type, error = %e, "audited write failed, rolling back");
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::warn!(entity_type, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
