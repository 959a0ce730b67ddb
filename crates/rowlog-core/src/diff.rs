//! Two-snapshot diffing.
//!
//! Keys are the sorted union of both records' keys, so a column that only
//! exists at one point in time still shows up. A key missing from a record is
//! reported as `None`, never as an error.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::entity::Snapshot;
use crate::record::AuditLogRecord;

/// A primary record, optionally compared against another one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapshotDiff {
    pub primary: AuditLogRecord,
    pub comparison: Option<AuditLogRecord>,
    /// Union of `data` keys, sorted.
    pub data_keys: Vec<String>,
    /// Union of `extra_data` keys, sorted.
    pub extra_data_keys: Vec<String>,
}

/// One key of a diff.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiffRow<'a> {
    pub key: &'a str,
    pub current: Option<&'a Value>,
    pub previous: Option<&'a Value>,
    pub changed: bool,
}

impl SnapshotDiff {
    #[must_use]
    pub fn new(primary: AuditLogRecord, comparison: Option<AuditLogRecord>) -> Self {
        let data_keys = union_keys(&primary.data, comparison.as_ref().map(|c| &c.data));
        let extra_data_keys = union_keys(
            &primary.extra_data,
            comparison.as_ref().map(|c| &c.extra_data),
        );
        Self {
            primary,
            comparison,
            data_keys,
            extra_data_keys,
        }
    }

    /// Rows for `data`.
    #[must_use]
    pub fn rows(&self) -> Vec<DiffRow<'_>> {
        self.build_rows(&self.data_keys, |r| &r.data)
    }

    /// Rows for `extra_data`.
    #[must_use]
    pub fn extra_rows(&self) -> Vec<DiffRow<'_>> {
        self.build_rows(&self.extra_data_keys, |r| &r.extra_data)
    }

    /// `data` keys whose value differs between the two records.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<&str> {
        self.rows()
            .into_iter()
            .filter(|row| row.changed)
            .map(|row| row.key)
            .collect()
    }

    fn build_rows<'a>(
        &'a self,
        keys: &'a [String],
        select: impl Fn(&'a AuditLogRecord) -> &'a Snapshot,
    ) -> Vec<DiffRow<'a>> {
        let current = select(&self.primary);
        let previous = self.comparison.as_ref().map(&select);
        keys.iter()
            .map(|key| {
                let cur = current.get(key);
                let prev = previous.and_then(|p| p.get(key));
                DiffRow {
                    key,
                    current: cur,
                    previous: prev,
                    changed: previous.is_some() && cur != prev,
                }
            })
            .collect()
    }
}

fn union_keys(primary: &Snapshot, other: Option<&Snapshot>) -> Vec<String> {
    let mut keys: BTreeSet<&String> = primary.keys().collect();
    if let Some(other) = other {
        keys.extend(other.keys());
    }
    keys.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Operation;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: i64, data: Value, extra: Value) -> AuditLogRecord {
        AuditLogRecord {
            id,
            entity_type: "child".into(),
            entity_type_id: "1".into(),
            entity_name: "c".into(),
            operation: Operation::Update,
            created_on: Utc::now(),
            created_by: None,
            data: data.as_object().cloned().unwrap_or_default(),
            extra_data: extra.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn union_handles_column_added_later() {
        let old = record(1, json!({"id": 1, "name": "foo"}), json!({}));
        let new = record(
            2,
            json!({"id": 1, "name": "bar", "age": 4}),
            json!({"parent": "Mum"}),
        );

        let diff = SnapshotDiff::new(new, Some(old));
        assert_eq!(diff.data_keys, vec!["age", "id", "name"]);
        assert_eq!(diff.extra_data_keys, vec!["parent"]);

        let rows = diff.rows();
        assert_eq!(rows[0].key, "age");
        assert_eq!(rows[0].current, Some(&json!(4)));
        assert_eq!(rows[0].previous, None);
        assert!(rows[0].changed);

        assert_eq!(rows[1].key, "id");
        assert!(!rows[1].changed);

        assert_eq!(diff.changed_keys(), vec!["age", "name"]);

        let extra = diff.extra_rows();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].previous, None);
    }

    #[test]
    fn union_handles_column_dropped_later() {
        let old = record(1, json!({"id": 1, "legacy": true}), json!({}));
        let new = record(2, json!({"id": 1}), json!({}));

        let diff = SnapshotDiff::new(new, Some(old));
        assert_eq!(diff.data_keys, vec!["id", "legacy"]);
        let legacy = &diff.rows()[1];
        assert_eq!(legacy.current, None);
        assert_eq!(legacy.previous, Some(&json!(true)));
    }

    #[test]
    fn without_comparison_nothing_is_changed() {
        let only = record(1, json!({"b": 2, "a": 1}), json!({}));
        let diff = SnapshotDiff::new(only, None);
        assert_eq!(diff.data_keys, vec!["a", "b"]);
        assert!(diff.rows().iter().all(|r| !r.changed && r.previous.is_none()));
        assert!(diff.changed_keys().is_empty());
    }

    #[test]
    fn union_keys_have_no_duplicates() {
        let a = record(1, json!({"x": 1, "y": 2}), json!({}));
        let b = record(2, json!({"y": 3, "x": 1}), json!({}));
        let diff = SnapshotDiff::new(a, Some(b));
        assert_eq!(diff.data_keys, vec!["x", "y"]);
    }
}
