//! Log table repository.
//!
//! Append and filtered reads over any table with the log record shape. Rows
//! are never updated or deleted; results are always newest first, ties on
//! `created_on` broken by `id`.

use rowlog_core::{AuditLogRecord, LogTable, NewLogEntry, Operation};

use crate::error::DatabaseError;
use crate::helpers::{format_timestamp, get_opt_string, parse_datetime, parse_enum, parse_snapshot};
use crate::service::AuditService;

/// Row limit applied when a filter does not set one.
pub const DEFAULT_LIMIT: u32 = 100;

pub(crate) const LOG_COLUMNS: &str = "id, entity_type, entity_type_id, entity_name, operation, created_on, created_by, data, extra_data";

pub(crate) const NEWEST_FIRST: &str = "ORDER BY created_on DESC, id DESC";

/// Filter criteria for log queries.
#[derive(Debug, Default, Clone)]
pub struct LogFilter {
    pub entity_type: Option<String>,
    pub entity_type_id: Option<String>,
    pub operation: Option<Operation>,
    pub created_by: Option<String>,
    pub limit: Option<u32>,
}

impl LogFilter {
    /// Filter on one correlation key.
    #[must_use]
    pub fn for_entity(entity_type: impl Into<String>, entity_type_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            entity_type_id: Some(entity_type_id.into()),
            ..Self::default()
        }
    }

    fn where_clause(&self, params: &mut Vec<libsql::Value>) -> String {
        let mut conditions = Vec::new();

        if let Some(ref et) = self.entity_type {
            params.push(libsql::Value::Text(et.clone()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = self.entity_type_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_type_id = ?{}", params.len()));
        }
        if let Some(op) = self.operation {
            params.push(libsql::Value::Text(op.as_str().to_string()));
            conditions.push(format!("operation = ?{}", params.len()));
        }
        if let Some(ref by) = self.created_by {
            params.push(libsql::Value::Text(by.clone()));
            conditions.push(format!("created_by = ?{}", params.len()));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }
}

/// Append one log row through `conn`, which may be an open transaction.
pub(crate) async fn insert_log(
    conn: &libsql::Connection,
    table: &LogTable,
    entry: NewLogEntry,
) -> Result<AuditLogRecord, DatabaseError> {
    let data = serde_json::to_string(&entry.data).map_err(anyhow::Error::from)?;
    let extra_data = serde_json::to_string(&entry.extra_data).map_err(anyhow::Error::from)?;

    conn.execute(
        &format!(
            "INSERT INTO {table} (entity_type, entity_type_id, entity_name, operation, created_on, created_by, data, extra_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        libsql::params![
            entry.entity_type.as_str(),
            entry.entity_type_id.as_str(),
            entry.entity_name.as_str(),
            entry.operation.as_str(),
            format_timestamp(&entry.created_on),
            entry.created_by.as_deref(),
            data,
            extra_data
        ],
    )
    .await?;

    let id = conn.last_insert_rowid();
    Ok(entry.into_record(id))
}

pub(crate) fn row_to_record(row: &libsql::Row) -> Result<AuditLogRecord, DatabaseError> {
    Ok(AuditLogRecord {
        id: row.get::<i64>(0)?,
        entity_type: row.get::<String>(1)?,
        entity_type_id: row.get::<String>(2)?,
        entity_name: row.get::<String>(3)?,
        operation: parse_enum(&row.get::<String>(4)?)?,
        created_on: parse_datetime(&row.get::<String>(5)?)?,
        created_by: get_opt_string(row, 6)?,
        data: parse_snapshot(get_opt_string(row, 7)?.as_deref())?,
        extra_data: parse_snapshot(get_opt_string(row, 8)?.as_deref())?,
    })
}

impl AuditService {
    /// Run a SELECT over a log table and collect the records.
    ///
    /// Waits for any open unit of work, so only committed rows are read.
    pub(crate) async fn fetch_records(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let _access = self.db().exclusive().await;
        let mut rows = self
            .db()
            .conn()
            .query(sql, libsql::params_from_iter(params))
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Query a log table with optional filters, newest first.
    ///
    /// Returns at most `filter.limit` rows, or [`DEFAULT_LIMIT`] when the
    /// filter sets none.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_logs(
        &self,
        table: &LogTable,
        filter: &LogFilter,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);
        self.select_logs(table, filter, Some(limit)).await
    }

    /// Filtered SELECT, newest first. `None` reads every matching row; the
    /// filter's own limit is ignored.
    pub(crate) async fn select_logs(
        &self,
        table: &LogTable,
        filter: &LogFilter,
        limit: Option<u32>,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let mut params = Vec::new();
        let where_clause = filter.where_clause(&mut params);
        let limit_clause = limit.map_or_else(String::new, |n| format!("LIMIT {n}"));
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM {table} {where_clause} {NEWEST_FIRST} {limit_clause}"
        );
        self.fetch_records(&sql, params).await
    }

    /// Count log rows matching a filter. The filter's limit is ignored.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_logs(
        &self,
        table: &LogTable,
        filter: &LogFilter,
    ) -> Result<u64, DatabaseError> {
        let mut params = Vec::new();
        let where_clause = filter.where_clause(&mut params);
        let _access = self.db().exclusive().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM {table} {where_clause}"),
                libsql::params_from_iter(params),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        u64::try_from(count).map_err(|e| DatabaseError::InvalidState(e.to_string()))
    }

    /// Fetch one log record by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no record has this id.
    pub async fn get_log(&self, table: &LogTable, id: i64) -> Result<AuditLogRecord, DatabaseError> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM {table} WHERE id = ?1");
        self.fetch_records(&sql, vec![libsql::Value::Integer(id)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound {
                what: "audit log".to_string(),
                id: id.to_string(),
            })
    }
}
