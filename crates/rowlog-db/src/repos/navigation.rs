//! History navigation.
//!
//! Entity to its log records, a log record to its entity, neighbours of a
//! record under the same correlation key, deleted entities and snapshot
//! diffs. Every list is newest first.

use rowlog_core::{AuditLogRecord, Audited, LogTable, Operation, SnapshotDiff};

use crate::error::DatabaseError;
use crate::helpers::format_timestamp;
use crate::persist::{Persisted, select_by_audit_id_sql};
use crate::repos::audit_log::{LOG_COLUMNS, LogFilter, NEWEST_FIRST};
use crate::service::AuditService;

impl AuditService {
    /// Log records of one entity instance, newest first.
    ///
    /// Reads the table `E` was registered with, or `E::log_table()` if it
    /// never was. With `limit` of `None` the whole history is returned.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history<E: Audited>(
        &self,
        entity: &E,
        limit: Option<u32>,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let table = self
            .registry()
            .get(E::ENTITY_TYPE)
            .map_or_else(E::log_table, |reg| reg.log_table.clone());
        self.history_for(&table, E::ENTITY_TYPE, &entity.audit_id(), limit)
            .await
    }

    /// Log records for a correlation key, newest first. Works for entities
    /// that no longer exist.
    ///
    /// `limit` caps the result to the newest rows; `None` returns all of them.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn history_for(
        &self,
        table: &LogTable,
        entity_type: &str,
        entity_type_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let filter = LogFilter::for_entity(entity_type, entity_type_id);
        self.select_logs(table, &filter, limit).await
    }

    /// `DELETE` records of one entity type. Answered from the log alone.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn deleted_entries(
        &self,
        table: &LogTable,
        entity_type: &str,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM {table}
             WHERE entity_type = ?1 AND operation = ?2 {NEWEST_FIRST}"
        );
        self.fetch_records(
            &sql,
            vec![
                libsql::Value::Text(entity_type.to_string()),
                libsql::Value::Text(Operation::Delete.as_str().to_string()),
            ],
        )
        .await
    }

    /// Records with the same correlation key strictly before `record`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn prior_records(
        &self,
        table: &LogTable,
        record: &AuditLogRecord,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM {table}
             WHERE entity_type = ?1 AND entity_type_id = ?2
               AND (created_on < ?3 OR (created_on = ?3 AND id < ?4))
             {NEWEST_FIRST}"
        );
        self.fetch_records(&sql, neighbour_params(record)).await
    }

    /// Records with the same correlation key strictly after `record`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn later_records(
        &self,
        table: &LogTable,
        record: &AuditLogRecord,
    ) -> Result<Vec<AuditLogRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM {table}
             WHERE entity_type = ?1 AND entity_type_id = ?2
               AND (created_on > ?3 OR (created_on = ?3 AND id > ?4))
             {NEWEST_FIRST}"
        );
        self.fetch_records(&sql, neighbour_params(record)).await
    }

    /// Load the live entity a record refers to.
    ///
    /// Returns `Ok(None)` if the record is about another entity type or the
    /// row no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or the row cannot be read.
    pub async fn audited_instance<E: Persisted>(
        &self,
        record: &AuditLogRecord,
    ) -> Result<Option<E>, DatabaseError> {
        if !record.is_for::<E>() {
            return Ok(None);
        }

        let sql = select_by_audit_id_sql::<E>()?;
        let _access = self.db().exclusive().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, [record.entity_type_id.as_str()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(E::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Diff record `id` against record `against`, or show it alone.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if either record is missing.
    pub async fn diff(
        &self,
        table: &LogTable,
        id: i64,
        against: Option<i64>,
    ) -> Result<SnapshotDiff, DatabaseError> {
        let primary = self.get_log(table, id).await?;
        let comparison = match against {
            Some(other) => Some(self.get_log(table, other).await?),
            None => None,
        };
        Ok(SnapshotDiff::new(primary, comparison))
    }
}

fn neighbour_params(record: &AuditLogRecord) -> Vec<libsql::Value> {
    vec![
        libsql::Value::Text(record.entity_type.clone()),
        libsql::Value::Text(record.entity_type_id.clone()),
        libsql::Value::Text(format_timestamp(&record.created_on)),
        libsql::Value::Integer(record.id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{Child, MyModel};
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;
    use rowlog_core::AuditContext;

    async fn model_with_history(svc: &AuditService) -> MyModel {
        let ctx = AuditContext::anonymous();
        let mut model = MyModel::new("v1");
        svc.insert(&ctx, &mut model).await.unwrap();
        model.name = "v2".into();
        svc.update(&ctx, &model).await.unwrap();
        model.name = "v3".into();
        svc.update(&ctx, &model).await.unwrap();
        model
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;

        let history = svc.history(&model, None).await.unwrap();
        let names: Vec<_> = history.iter().map(|r| r.data["name"].clone()).collect();
        assert_eq!(names, vec!["v3", "v2", "v1"]);
        assert_eq!(history[2].operation, Operation::Insert);
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let history = svc.history(&model, Some(2)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data["name"], "v3");
    }

    #[tokio::test]
    async fn prior_and_later_records() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let table = LogTable::default();
        let history = svc.history(&model, None).await.unwrap();
        let middle = &history[1];

        let prior = svc.prior_records(&table, middle).await.unwrap();
        assert_eq!(prior.len(), 1);
        assert_eq!(prior[0].data["name"], "v1");

        let later = svc.later_records(&table, middle).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].data["name"], "v3");

        assert!(svc.later_records(&table, &history[0]).await.unwrap().is_empty());
        assert!(svc.prior_records(&table, &history[2]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn neighbours_break_timestamp_ties_on_id() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let table = LogTable::default();
        let history = svc.history(&model, None).await.unwrap();

        // Same created_on as the newest row, but a higher id.
        let mut tied = history[0].clone();
        tied.id += 100;
        let prior = svc.prior_records(&table, &tied).await.unwrap();
        assert_eq!(prior.len(), 3);
    }

    #[tokio::test]
    async fn audited_instance_resolves_live_row() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let record = &svc.history(&model, Some(1)).await.unwrap()[0];

        let live: MyModel = svc.audited_instance(record).await.unwrap().expect("live");
        assert_eq!(live, model);

        let wrong_type: Option<Child> = svc.audited_instance(record).await.unwrap();
        assert!(wrong_type.is_none());
    }

    #[tokio::test]
    async fn audited_instance_of_deleted_entity_is_none() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        svc.delete(&AuditContext::anonymous(), &model).await.unwrap();

        let record = &svc.history(&model, Some(1)).await.unwrap()[0];
        assert_eq!(record.operation, Operation::Delete);
        let live: Option<MyModel> = svc.audited_instance(record).await.unwrap();
        assert!(live.is_none());
    }

    #[tokio::test]
    async fn deleted_entries_survive_the_entity() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let mut keep = MyModel::new("keep");
        svc.insert(&AuditContext::anonymous(), &mut keep).await.unwrap();
        svc.delete(&AuditContext::anonymous(), &model).await.unwrap();

        let deleted = svc
            .deleted_entries(&LogTable::default(), "mymodel")
            .await
            .unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].entity_type_id, model.id.unwrap().to_string());
        assert_eq!(deleted[0].data["name"], "v3");
    }

    #[tokio::test]
    async fn diff_between_two_records() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let table = LogTable::default();
        let history = svc.history(&model, None).await.unwrap();

        let diff = svc
            .diff(&table, history[0].id, Some(history[2].id))
            .await
            .unwrap();
        assert_eq!(diff.data_keys, vec!["id", "name"]);
        assert_eq!(diff.changed_keys(), vec!["name"]);

        let alone = svc.diff(&table, history[0].id, None).await.unwrap();
        assert!(alone.comparison.is_none());
        assert!(alone.changed_keys().is_empty());
    }

    #[tokio::test]
    async fn diff_against_missing_record_is_not_found() {
        let svc = test_service().await;
        let model = model_with_history(&svc).await;
        let history = svc.history(&model, Some(1)).await.unwrap();
        let err = svc
            .diff(&LogTable::default(), history[0].id, Some(9_999))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
