//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_log_store;
mod in_memory_authorization_repository;
mod in_memory_record_store;
mod postgres_audit_log_repository;
mod postgres_record_store;
mod record_sql;

use quire_core::{AppError, AppResult};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

pub use in_memory_audit_log_store::InMemoryAuditLogStore;
pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use in_memory_record_store::InMemoryRecordStore;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_record_store::PostgresRecordStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    info!("database migrations are up to date");
    Ok(())
}
