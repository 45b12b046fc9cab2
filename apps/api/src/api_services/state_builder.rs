use std::sync::Arc;

use quire_application::{
    AuditLogRepository, AuditLogService, AuditWriter, AuthorizationService, EventBusBuilder,
    QueryService, RecordCommandService, RecordStore, RecordWriteStore,
};
use quire_core::AppError;
use quire_domain::Permission;
use quire_infrastructure::{
    InMemoryAuditLogStore, InMemoryAuthorizationRepository, InMemoryRecordStore,
    PostgresAuditLogRepository, PostgresRecordStore,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::dev_seed;
use crate::resource_catalog::{self, CatalogStores};
use crate::state::AppState;

struct StorageAdapters {
    records: Arc<dyn RecordStore>,
    record_writer: Arc<dyn RecordWriteStore>,
    audit_entries: Arc<dyn AuditLogRepository>,
    audit_records: Arc<dyn RecordStore>,
}

/// Wires services for the configured backend. `pool` is `None` for in-memory storage.
pub async fn build_app_state(
    config: &ApiConfig,
    pool: Option<PgPool>,
) -> Result<AppState, AppError> {
    let adapters = storage_adapters(pool);

    let authorization_service =
        AuthorizationService::new(Arc::new(authorization_repository(config)));
    let registry = resource_catalog::build_registry(
        &CatalogStores {
            records: adapters.records.clone(),
            record_writer: adapters.record_writer.clone(),
            audit_records: adapters.audit_records.clone(),
        },
        authorization_service,
    )?;
    let resource_types = registry
        .definitions()
        .into_iter()
        .map(|definition| definition.resource_type().to_owned())
        .collect::<Vec<_>>();
    info!(?resource_types, "resource catalog registered");
    let query_service = QueryService::new(Arc::new(registry));

    let audit_writer = AuditWriter::spawn(adapters.audit_entries.clone(), config.audit_writer)?;
    let event_bus = Arc::new(
        EventBusBuilder::new()
            .subscribe(Arc::new(audit_writer.listener()))
            .build(),
    );
    info!(
        subscribers = event_bus.subscriber_count(),
        queue_capacity = config.audit_writer.queue_capacity,
        "event bus ready"
    );

    if config.dev_seed {
        dev_seed::run(adapters.records.as_ref(), adapters.record_writer.as_ref()).await?;
    }

    Ok(AppState {
        record_command_service: RecordCommandService::new(query_service.clone(), event_bus),
        audit_log_service: AuditLogService::new(query_service.clone()),
        query_service,
        audit_writer,
    })
}

fn storage_adapters(pool: Option<PgPool>) -> StorageAdapters {
    match pool {
        Some(pool) => {
            let records = Arc::new(PostgresRecordStore::new(pool.clone()));
            let audit_log = Arc::new(PostgresAuditLogRepository::new(pool));
            StorageAdapters {
                records: records.clone(),
                record_writer: records,
                audit_entries: audit_log.clone(),
                audit_records: audit_log,
            }
        }
        None => {
            let records = Arc::new(InMemoryRecordStore::new());
            let audit_log = Arc::new(InMemoryAuditLogStore::new());
            StorageAdapters {
                records: records.clone(),
                record_writer: records,
                audit_entries: audit_log.clone(),
                audit_records: audit_log,
            }
        }
    }
}

fn authorization_repository(config: &ApiConfig) -> InMemoryAuthorizationRepository {
    let repository = config
        .super_admin_subjects
        .iter()
        .fold(InMemoryAuthorizationRepository::new(), |repository, subject| {
            repository.with_grant(subject.as_str(), Permission::all().iter().copied())
        });

    config
        .reader_subjects
        .iter()
        .fold(repository, |repository, subject| {
            repository.with_grant(subject.as_str(), [Permission::RecordRead])
        })
}
