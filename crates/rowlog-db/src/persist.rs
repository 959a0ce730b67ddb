//! Generic row persistence for audited entity types.
//!
//! SQL is built from `Audited::ENTITY_TYPE` (the table) and `Audited::COLUMNS`
//! (first column is the primary key). Identifiers are validated before any
//! statement is formatted.

use rowlog_core::errors::SnapshotError;
use rowlog_core::{Audited, FieldValue};

use crate::error::DatabaseError;
use crate::helpers::{ensure_identifiers, field_value_to_sql};

/// An audited entity type that can be written and read back generically.
pub trait Persisted: Audited + Sized {
    /// Build an instance from a row selected with `COLUMNS` in order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a column cannot be read or parsed.
    fn from_row(row: &libsql::Row) -> Result<Self, DatabaseError>;

    /// Receive the rowid generated for an insert with a `Null` primary key.
    ///
    /// Types whose key the store generates must override this. With the
    /// default, such an insert fails and is rolled back.
    fn assign_rowid(&mut self, rowid: i64) {
        let _ = rowid;
    }
}

/// A statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<libsql::Value>,
}

fn checked_values<E: Audited>(entity: &E) -> Result<Vec<FieldValue>, DatabaseError> {
    ensure_identifiers(std::iter::once(E::ENTITY_TYPE).chain(E::COLUMNS.iter().copied()))?;
    let values = entity.column_values();
    if values.len() != E::COLUMNS.len() || values.is_empty() {
        return Err(SnapshotError::ColumnMismatch {
            entity_type: E::ENTITY_TYPE.to_string(),
            expected: E::COLUMNS.len(),
            actual: values.len(),
        }
        .into());
    }
    Ok(values)
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT` of every column. A `Null` primary key is left to the store.
///
/// # Errors
///
/// Returns `DatabaseError` for invalid identifiers or misaligned values.
pub fn insert_statement<E: Audited>(entity: &E) -> Result<Statement, DatabaseError> {
    let values = checked_values(entity)?;
    let skip_pk = values[0].is_null();

    let (columns, params): (Vec<&str>, Vec<libsql::Value>) = E::COLUMNS
        .iter()
        .zip(&values)
        .skip(usize::from(skip_pk))
        .map(|(col, val)| (*col, field_value_to_sql(val)))
        .unzip();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::ENTITY_TYPE,
        columns.join(", "),
        placeholders(columns.len())
    );
    Ok(Statement { sql, params })
}

/// `UPDATE` of every non-key column, matched on the primary key.
///
/// # Errors
///
/// Returns `DatabaseError` for invalid identifiers, misaligned values or a
/// `Null` primary key.
pub fn update_statement<E: Audited>(entity: &E) -> Result<Statement, DatabaseError> {
    let values = checked_values(entity)?;
    if values[0].is_null() {
        return Err(DatabaseError::InvalidState(format!(
            "cannot update {} without a primary key",
            E::ENTITY_TYPE
        )));
    }

    let sets: Vec<String> = E::COLUMNS[1..]
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = ?{}", i + 1))
        .collect();
    let mut params: Vec<libsql::Value> = values[1..].iter().map(field_value_to_sql).collect();
    params.push(field_value_to_sql(&values[0]));

    let sql = if sets.is_empty() {
        // Key-only tables: touch the row so a missing key is still detected.
        format!(
            "UPDATE {table} SET {pk} = {pk} WHERE {pk} = ?1",
            table = E::ENTITY_TYPE,
            pk = E::COLUMNS[0]
        )
    } else {
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            E::ENTITY_TYPE,
            sets.join(", "),
            E::COLUMNS[0],
            params.len()
        )
    };
    Ok(Statement { sql, params })
}

/// `DELETE` matched on the primary key.
///
/// # Errors
///
/// Returns `DatabaseError` for invalid identifiers, misaligned values or a
/// `Null` primary key.
pub fn delete_statement<E: Audited>(entity: &E) -> Result<Statement, DatabaseError> {
    let values = checked_values(entity)?;
    if values[0].is_null() {
        return Err(DatabaseError::InvalidState(format!(
            "cannot delete {} without a primary key",
            E::ENTITY_TYPE
        )));
    }
    Ok(Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?1",
            E::ENTITY_TYPE,
            E::COLUMNS[0]
        ),
        params: vec![field_value_to_sql(&values[0])],
    })
}

/// `SELECT` of every column for the row whose key renders as `audit_id`.
///
/// Matching on the key cast to text mirrors how `entity_type_id` is stored.
///
/// # Errors
///
/// Returns `DatabaseError::Core` for invalid identifiers.
pub fn select_by_audit_id_sql<E: Audited>() -> Result<String, DatabaseError> {
    ensure_identifiers(std::iter::once(E::ENTITY_TYPE).chain(E::COLUMNS.iter().copied()))?;
    let pk = E::COLUMNS.first().ok_or_else(|| {
        DatabaseError::Config(format!("{} declares no columns", E::ENTITY_TYPE))
    })?;
    Ok(format!(
        "SELECT {} FROM {} WHERE CAST({pk} AS TEXT) = ?1",
        E::COLUMNS.join(", "),
        E::ENTITY_TYPE
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::MyModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_without_key_lets_store_assign_it() {
        let stmt = insert_statement(&MyModel::new("foo")).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO mymodel (name) VALUES (?1)");
        assert_eq!(stmt.params, vec![libsql::Value::Text("foo".into())]);
    }

    #[test]
    fn insert_with_key_writes_it() {
        let stmt = insert_statement(&MyModel::saved(7, "foo")).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO mymodel (id, name) VALUES (?1, ?2)");
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn update_matches_on_key() {
        let stmt = update_statement(&MyModel::saved(7, "bar")).unwrap();
        assert_eq!(stmt.sql, "UPDATE mymodel SET name = ?1 WHERE id = ?2");
        assert_eq!(
            stmt.params,
            vec![libsql::Value::Text("bar".into()), libsql::Value::Integer(7)]
        );
    }

    #[test]
    fn update_and_delete_need_a_key() {
        assert!(matches!(
            update_statement(&MyModel::new("foo")),
            Err(DatabaseError::InvalidState(_))
        ));
        assert!(matches!(
            delete_statement(&MyModel::new("foo")),
            Err(DatabaseError::InvalidState(_))
        ));
    }

    #[test]
    fn delete_matches_on_key() {
        let stmt = delete_statement(&MyModel::saved(7, "foo")).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM mymodel WHERE id = ?1");
    }

    #[test]
    fn select_casts_key_to_text() {
        assert_eq!(
            select_by_audit_id_sql::<MyModel>().unwrap(),
            "SELECT id, name FROM mymodel WHERE CAST(id AS TEXT) = ?1"
        );
    }
}
