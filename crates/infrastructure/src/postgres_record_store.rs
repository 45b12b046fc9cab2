use async_trait::async_trait;
use quire_application::{RecordQuery, RecordStore, RecordWindow, RecordWriteStore};
use quire_core::{AppError, AppResult};
use quire_domain::Record;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::record_sql::{self, RECORDS_RELATION};


/// PostgreSQL-backed record store over the `records` table.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
        record_sql::count_records(&self.pool, RECORDS_RELATION, query).await
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>> {
        record_sql::query_records(&self.pool, RECORDS_RELATION, query, window).await
    }
}

#[async_trait]
impl RecordWriteStore for PostgresRecordStore {
    async fn create_record(&self, resource_type: &str, data: Value) -> AppResult<Record> {
        let record = Record::new(Uuid::new_v4().to_string(), resource_type, data)?;
        let record_id = parse_record_uuid(record.record_id().as_str())?;

        sqlx::query(
            r#"
            INSERT INTO records (id, resource_type, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record_id)
        .bind(resource_type)
        .bind(record.data())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create record of resource '{resource_type}': {error}"
            ))
        })?;

        Ok(record)
    }

    async fn update_record(
        &self,
        resource_type: &str,
        record_id: &str,
        data: Value,
    ) -> AppResult<Record> {
        let record = Record::new(record_id, resource_type, data)?;
        let Ok(record_uuid) = parse_record_uuid(record_id) else {
            return Err(missing(resource_type, record_id));
        };

        let result = sqlx::query(
            r#"
            UPDATE records
            SET data = $3
            WHERE id = $1 AND resource_type = $2
            "#,
        )
        .bind(record_uuid)
        .bind(resource_type)
        .bind(record.data())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update record '{record_id}' of resource '{resource_type}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(missing(resource_type, record_id));
        }

        Ok(record)
    }

    async fn delete_record(&self, resource_type: &str, record_id: &str) -> AppResult<()> {
        let Ok(record_uuid) = parse_record_uuid(record_id) else {
            return Err(missing(resource_type, record_id));
        };

        let result = sqlx::query("DELETE FROM records WHERE id = $1 AND resource_type = $2")
            .bind(record_uuid)
            .bind(resource_type)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete record '{record_id}' of resource '{resource_type}': {error}"
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(missing(resource_type, record_id));
        }

        Ok(())
    }
}

fn parse_record_uuid(record_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(record_id).map_err(|error| {
        AppError::Validation(format!("invalid record id '{record_id}': {error}"))
    })
}

fn missing(resource_type: &str, record_id: &str) -> AppError {
    AppError::NotFound(format!(
        "record '{record_id}' of resource '{resource_type}' does not exist"
    ))
}
