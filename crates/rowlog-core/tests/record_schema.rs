//! Serde roundtrip and JsonSchema validation for the log record shape.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rowlog_core::{AuditLogRecord, Operation, SnapshotDiff};
use schemars::schema_for;
use serde_json::json;

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

fn sample(id: i64, operation: Operation, name: &str) -> AuditLogRecord {
    AuditLogRecord {
        id,
        entity_type: "mymodel".into(),
        entity_type_id: "7".into(),
        entity_name: name.into(),
        operation,
        created_on: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        created_by: Some("U1".into()),
        data: json!({"id": 7, "name": name}).as_object().cloned().unwrap(),
        extra_data: serde_json::Map::new(),
    }
}

#[test]
fn record_roundtrips_and_validates() {
    let record = sample(1, Operation::Insert, "foo");

    let json_str = serde_json::to_string_pretty(&record).unwrap();
    let recovered: AuditLogRecord = serde_json::from_str(&json_str).unwrap();
    assert_eq!(recovered, record);

    let schema = serde_json::to_value(schema_for!(AuditLogRecord)).unwrap();
    let instance = serde_json::to_value(&record).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "schema validation failed: {errors:?}");
}

#[test]
fn schema_rejects_unknown_operation() {
    let schema = serde_json::to_value(schema_for!(AuditLogRecord)).unwrap();
    let mut instance = serde_json::to_value(sample(1, Operation::Update, "foo")).unwrap();
    instance["operation"] = json!("UPSERT");
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn operation_serializes_upper_case() {
    let instance = serde_json::to_value(sample(3, Operation::Delete, "foo")).unwrap();
    assert_eq!(instance["operation"], json!("DELETE"));
    assert_eq!(instance["created_by"], json!("U1"));
}

#[test]
fn rename_diff_reports_only_name() {
    let before = sample(1, Operation::Insert, "foo");
    let after = sample(2, Operation::Update, "bar");

    let diff = SnapshotDiff::new(after, Some(before));
    assert_eq!(diff.data_keys, vec!["id", "name"]);
    assert_eq!(diff.changed_keys(), vec!["name"]);
}
