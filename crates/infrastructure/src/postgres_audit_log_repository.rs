use async_trait::async_trait;
use quire_application::{AuditLogRepository, RecordQuery, RecordStore, RecordWindow};
use quire_core::{AppError, AppResult};
use quire_domain::{AuditLogEntry, Record};
use sqlx::PgPool;

use crate::record_sql::{self, AUDIT_LOG_RELATION};


/// PostgreSQL-backed append-only audit trail.
///
/// Entries are inserted by the audit writer and listed through the record pipeline.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (id, action, "user", details, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.entry_id())
        .bind(entry.action())
        .bind(entry.user())
        .bind(entry.details())
        .bind(entry.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append audit entry '{}': {error}",
                entry.action()
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresAuditLogRepository {
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
        record_sql::count_records(&self.pool, AUDIT_LOG_RELATION, query).await
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>> {
        record_sql::query_records(&self.pool, AUDIT_LOG_RELATION, query, window).await
    }
}
