//! The audit capability an entity type opts into.
//!
//! An entity type becomes audited by implementing [`Audited`]: it names its
//! stable type tag, its persisted columns, its relationships and the log table
//! its history goes to. Snapshots are produced fresh at every write.

use std::fmt;

use serde_json::Value;

use crate::errors::{RelationError, SnapshotError};
use crate::log_table::LogTable;
use crate::value::FieldValue;

/// JSON object captured into `data` / `extra_data`.
pub type Snapshot = serde_json::Map<String, Value>;

/// Maximum length of `entity_name`, in characters.
pub const ENTITY_NAME_MAX: usize = 255;

const ELLIPSIS: &str = "..";

/// Resolved value of one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Related {
    /// Nothing is related.
    Null,
    /// A single related entity, rendered through its `Display`.
    One(String),
    /// A to-many relation. Never snapshotted.
    Many,
}

impl Related {
    pub fn one(value: &impl fmt::Display) -> Self {
        Self::One(value.to_string())
    }

    pub fn from_option<T: fmt::Display>(value: Option<&T>) -> Self {
        value.map_or(Self::Null, Self::one)
    }
}

/// Capability of an entity type whose writes are recorded in an audit log.
///
/// ```
/// use std::fmt;
/// use rowlog_core::{Audited, FieldValue, LogTable};
///
/// struct Parent { id: i64, name: String }
///
/// impl fmt::Display for Parent {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(&self.name)
///     }
/// }
///
/// impl Audited for Parent {
///     const ENTITY_TYPE: &'static str = "parent";
///     const COLUMNS: &'static [&'static str] = &["id", "name"];
///
///     fn log_table() -> LogTable {
///         LogTable::default()
///     }
///
///     fn column_values(&self) -> Vec<FieldValue> {
///         vec![self.id.into(), self.name.as_str().into()]
///     }
/// }
///
/// let parent = Parent { id: 7, name: "foo".into() };
/// assert_eq!(parent.audit_id(), "7");
/// assert_eq!(parent.audit_data().unwrap()["name"], "foo");
/// ```
pub trait Audited: fmt::Display {
    /// Stable type tag stored in `entity_type`. Usually the table name.
    const ENTITY_TYPE: &'static str;

    /// Persisted columns in definition order. The first one is the primary key.
    const COLUMNS: &'static [&'static str];

    /// Declared relationship names.
    const RELATIONSHIPS: &'static [&'static str] = &[];

    /// Log table this entity type writes its history to.
    fn log_table() -> LogTable;

    /// When true, writes of this type never produce log rows automatically.
    fn manage_audit_manually() -> bool {
        false
    }

    /// Column and relationship names left out of snapshots.
    fn audit_exclude() -> &'static [&'static str] {
        &[]
    }

    /// Current in-memory column values, aligned with [`Self::COLUMNS`].
    fn column_values(&self) -> Vec<FieldValue>;

    /// Resolve one of [`Self::RELATIONSHIPS`].
    ///
    /// # Errors
    ///
    /// Returns `RelationError` when the related value cannot be loaded.
    fn related(&self, name: &str) -> Result<Related, RelationError> {
        let _ = name;
        Ok(Related::Null)
    }

    /// String form of the primary key, used as `entity_type_id`.
    fn audit_id(&self) -> String {
        match self.column_values().into_iter().next() {
            Some(FieldValue::Text(s) | FieldValue::Enum(s)) => s,
            Some(FieldValue::Null) | None => String::new(),
            Some(other) => match other.encode() {
                Ok(Value::String(s)) => s,
                Ok(v) => v.to_string(),
                Err(_) => String::new(),
            },
        }
    }

    /// Encoded snapshot of every persisted, non-excluded column.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the column values do not line up with
    /// [`Self::COLUMNS`] or a value cannot be encoded. Either aborts the write.
    fn audit_data(&self) -> Result<Snapshot, SnapshotError> {
        let values = self.column_values();
        if values.len() != Self::COLUMNS.len() {
            return Err(SnapshotError::ColumnMismatch {
                entity_type: Self::ENTITY_TYPE.to_string(),
                expected: Self::COLUMNS.len(),
                actual: values.len(),
            });
        }

        let excluded = Self::audit_exclude();
        let mut data = Snapshot::new();
        for (column, value) in Self::COLUMNS.iter().zip(values) {
            if excluded.contains(column) {
                continue;
            }
            let encoded = value.encode().map_err(|source| SnapshotError::Encode {
                entity_type: Self::ENTITY_TYPE.to_string(),
                column: (*column).to_string(),
                source,
            })?;
            data.insert((*column).to_string(), encoded);
        }
        Ok(data)
    }

    /// String-rendered to-one relationships that are set.
    ///
    /// Unresolvable relationships are skipped; they never fail the write.
    fn audit_extra_data(&self) -> Snapshot {
        let excluded = Self::audit_exclude();
        let mut extra = Snapshot::new();
        for name in Self::RELATIONSHIPS {
            if excluded.contains(name) {
                continue;
            }
            match self.related(name) {
                Ok(Related::One(rendered)) => {
                    extra.insert((*name).to_string(), Value::String(rendered));
                }
                Ok(Related::Null | Related::Many) => {}
                Err(e) => {
                    tracing::debug!(
                        entity_type = Self::ENTITY_TYPE,
                        relationship = *name,
                        error = %e,
                        "skipping relationship in audit snapshot"
                    );
                }
            }
        }
        extra
    }

    /// Human-readable label stored in `entity_name`.
    fn entity_name(&self) -> String {
        truncate_entity_name(&self.to_string())
    }
}

/// Truncate to [`ENTITY_NAME_MAX`] characters, ending in `".."` when cut.
#[must_use]
pub fn truncate_entity_name(name: &str) -> String {
    if name.chars().count() <= ENTITY_NAME_MAX {
        return name.to_string();
    }
    let mut truncated: String = name
        .chars()
        .take(ENTITY_NAME_MAX - ELLIPSIS.len())
        .collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
