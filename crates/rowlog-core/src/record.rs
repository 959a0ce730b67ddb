//! Audit log record shape.
//!
//! A log record is immutable once written. It is tied to its entity through a
//! correlation key `(entity_type, entity_type_id)` rather than a foreign key,
//! so one log table can serve entity types with unrelated key types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Audited, Snapshot};
use crate::enums::Operation;
use crate::errors::SnapshotError;
use crate::identity::AuditContext;

/// A row read back from a log table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AuditLogRecord {
    pub id: i64,
    pub entity_type: String,
    pub entity_type_id: String,
    pub entity_name: String,
    pub operation: Operation,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<String>,
    pub data: Snapshot,
    pub extra_data: Snapshot,
}

impl AuditLogRecord {
    /// Keys of `data`, sorted.
    #[must_use]
    pub fn data_keys(&self) -> Vec<String> {
        sorted_keys(&self.data)
    }

    /// Keys of `extra_data`, sorted.
    #[must_use]
    pub fn extra_data_keys(&self) -> Vec<String> {
        sorted_keys(&self.extra_data)
    }

    /// Value of a `data` key. `None` if the key did not exist in this snapshot.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[must_use]
    pub fn extra_value(&self, key: &str) -> Option<&Value> {
        self.extra_data.get(key)
    }

    #[must_use]
    pub fn correlation_key(&self) -> (&str, &str) {
        (&self.entity_type, &self.entity_type_id)
    }

    /// Whether this record belongs to entity type `E`.
    #[must_use]
    pub fn is_for<E: Audited>(&self) -> bool {
        self.entity_type == E::ENTITY_TYPE
    }
}

fn sorted_keys(map: &Snapshot) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

/// A log row about to be appended.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewLogEntry {
    pub entity_type: String,
    pub entity_type_id: String,
    pub entity_name: String,
    pub operation: Operation,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<String>,
    pub data: Snapshot,
    pub extra_data: Snapshot,
}

impl NewLogEntry {
    /// Capture the current state of `entity` for a write of kind `operation`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` when the column snapshot cannot be produced.
    pub fn capture<E: Audited>(
        operation: Operation,
        entity: &E,
        ctx: &AuditContext,
        created_on: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            entity_type: E::ENTITY_TYPE.to_string(),
            entity_type_id: entity.audit_id(),
            entity_name: entity.entity_name(),
            operation,
            created_on,
            created_by: ctx.actor_id().map(String::from),
            data: entity.audit_data()?,
            extra_data: entity.audit_extra_data(),
        })
    }

    /// The stored record once the store has assigned its id.
    #[must_use]
    pub fn into_record(self, id: i64) -> AuditLogRecord {
        AuditLogRecord {
            id,
            entity_type: self.entity_type,
            entity_type_id: self.entity_type_id,
            entity_name: self.entity_name,
            operation: self.operation,
            created_on: self.created_on,
            created_by: self.created_by,
            data: self.data,
            extra_data: self.extra_data,
        }
    }
}
