//! Registry of audited entity types.
//!
//! Populated once at startup. The log table of each type is resolved here and
//! cached, so writes never call `Audited::log_table` again.

use std::collections::HashMap;

use rowlog_core::{Audited, LogTable};

use crate::error::DatabaseError;
use crate::helpers::ensure_identifiers;

/// How writes of one entity type are audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub entity_type: &'static str,
    pub log_table: LogTable,
    /// Manual mode: the interceptor writes nothing for this type.
    pub manual: bool,
}

#[derive(Debug, Default)]
pub struct AuditRegistry {
    entries: HashMap<&'static str, Registration>,
}

impl AuditRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `E`. Registering the same type twice with the same log table is a
    /// no-op.
    ///
    /// Does not touch the database; `AuditService::register` verifies the log
    /// table shape before calling this.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` if `E` is already registered against a
    /// different log table, or `DatabaseError::Core` if its type tag or a
    /// column name is not a plain identifier.
    pub fn insert<E: Audited>(&mut self) -> Result<&Registration, DatabaseError> {
        ensure_identifiers(std::iter::once(E::ENTITY_TYPE).chain(E::COLUMNS.iter().copied()))?;
        if E::COLUMNS.is_empty() {
            return Err(DatabaseError::Config(format!(
                "{} declares no columns",
                E::ENTITY_TYPE
            )));
        }

        let registration = Registration {
            entity_type: E::ENTITY_TYPE,
            log_table: E::log_table(),
            manual: E::manage_audit_manually(),
        };

        if let Some(existing) = self.entries.get(E::ENTITY_TYPE) {
            if existing.log_table != registration.log_table {
                return Err(DatabaseError::Config(format!(
                    "{} is already registered with log table '{}', not '{}'",
                    E::ENTITY_TYPE,
                    existing.log_table,
                    registration.log_table
                )));
            }
        }

        Ok(self
            .entries
            .entry(E::ENTITY_TYPE)
            .or_insert(registration))
    }

    #[must_use]
    pub fn get(&self, entity_type: &str) -> Option<&Registration> {
        self.entries.get(entity_type)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotRegistered` if `E` was never registered.
    pub fn lookup<E: Audited>(&self) -> Result<&Registration, DatabaseError> {
        self.get(E::ENTITY_TYPE)
            .ok_or_else(|| DatabaseError::NotRegistered(E::ENTITY_TYPE.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values()
    }
}
