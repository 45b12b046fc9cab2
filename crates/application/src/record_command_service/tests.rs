use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quire_core::{AppError, AppResult, UserIdentity};
use quire_domain::{Permission, Record, ResourceDefinition};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::{
    AuthorizationRepository, AuthorizationService, DomainEvent, EventBusBuilder, EventSubscriber,
    PermissionResourcePolicy, QueryService, RecordQuery, RecordStore, RecordWindow,
    RecordWriteStore, RegisteredResource, ResourceRegistry,
};

use super::RecordCommandService;

#[derive(Default)]
struct FakeRecordStore {
    records: Mutex<Vec<Record>>,
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
        let records = self.records.lock().await;
        Ok(records.iter().filter(|record| query.matches(record)).count())
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>> {
        let records = self.records.lock().await;
        let window = window.unwrap_or(RecordWindow {
            offset: 0,
            limit: usize::MAX,
        });
        Ok(records
            .iter()
            .filter(|record| query.matches(record))
            .skip(window.offset)
            .take(window.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordWriteStore for FakeRecordStore {
    async fn create_record(&self, resource_type: &str, data: Value) -> AppResult<Record> {
        let mut records = self.records.lock().await;
        let record = Record::new(format!("r-{}", records.len() + 1), resource_type, data)?;
        records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        resource_type: &str,
        record_id: &str,
        data: Value,
    ) -> AppResult<Record> {
        let mut records = self.records.lock().await;
        let Some(slot) = records
            .iter_mut()
            .find(|record| record.record_id().as_str() == record_id)
        else {
            return Err(AppError::NotFound(record_id.to_owned()));
        };
        *slot = Record::new(record_id, resource_type, data)?;
        Ok(slot.clone())
    }

    async fn delete_record(&self, _resource_type: &str, record_id: &str) -> AppResult<()> {
        self.records
            .lock()
            .await
            .retain(|record| record.record_id().as_str() != record_id);
        Ok(())
    }
}

struct FakeAuthorizationRepository;

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        Ok(match subject {
            "admin" => Permission::all().to_vec(),
            "editor" => vec![Permission::RecordRead, Permission::RecordWrite],
            _ => vec![Permission::RecordRead],
        })
    }
}

#[derive(Default)]
struct RecordingSubscriber {
    events: Mutex<Vec<DomainEvent>>,
}

#[async_trait]
impl EventSubscriber for RecordingSubscriber {
    async fn handle(&self, event: &DomainEvent) {
        self.events.lock().await.push(event.clone());
    }
}

struct Harness {
    service: RecordCommandService,
    store: Arc<FakeRecordStore>,
    events: Arc<RecordingSubscriber>,
}

fn harness() -> Harness {
    let store = Arc::new(FakeRecordStore::default());
    let events = Arc::new(RecordingSubscriber::default());
    let policy = Arc::new(
        PermissionResourcePolicy::records(AuthorizationService::new(Arc::new(
            FakeAuthorizationRepository,
        )))
        .with_owner_field("owner"),
    );

    let mut registry = ResourceRegistry::new();
    registry
        .register(
            RegisteredResource::new(
                ResourceDefinition::new("note", "Notes").unwrap_or_else(|_| unreachable!()),
                store.clone(),
                policy.clone(),
            )
            .with_writer(store.clone()),
        )
        .unwrap_or_else(|_| unreachable!());
    registry
        .register(RegisteredResource::new(
            ResourceDefinition::new("report", "Reports").unwrap_or_else(|_| unreachable!()),
            store.clone(),
            policy,
        ))
        .unwrap_or_else(|_| unreachable!());

    let bus = EventBusBuilder::new().subscribe(events.clone()).build();
    Harness {
        service: RecordCommandService::new(
            QueryService::new(Arc::new(registry)),
            Arc::new(bus),
        ),
        store,
        events,
    }
}

fn actor(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject)
}

#[tokio::test]
async fn create_broadcasts_record_created() {
    let harness = harness();
    let record = harness
        .service
        .create_record(&actor("editor"), "note", json!({"title": "hello"}))
        .await
        .unwrap_or_else(|_| unreachable!());

    let events = harness.events.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "record.created");
    assert_eq!(
        events[0].payload(),
        Some(&json!({
            "user": "editor",
            "details": {"resource_type": "note", "record_id": record.record_id().as_str()},
        }))
    );
}

#[tokio::test]
async fn update_outside_scope_is_not_found_and_silent() {
    let harness = harness();
    let record = harness
        .service
        .create_record(&actor("admin"), "note", json!({"owner": "admin"}))
        .await
        .unwrap_or_else(|_| unreachable!());

    let result = harness
        .service
        .update_record(
            &actor("editor"),
            "note",
            record.record_id().as_str(),
            json!({"owner": "editor"}),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(harness.events.events.lock().await.len(), 1);
}

#[tokio::test]
async fn owner_can_update_and_delete_own_record() {
    let harness = harness();
    let record = harness
        .service
        .create_record(&actor("editor"), "note", json!({"owner": "editor", "v": 1}))
        .await
        .unwrap_or_else(|_| unreachable!());
    let record_id = record.record_id().as_str().to_owned();

    let updated = harness
        .service
        .update_record(
            &actor("editor"),
            "note",
            &record_id,
            json!({"owner": "editor", "v": 2}),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.field("v"), Some(json!(2)));

    harness
        .service
        .delete_record(&actor("editor"), "note", &record_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(harness.store.records.lock().await.is_empty());
    let names: Vec<String> = harness
        .events
        .events
        .lock()
        .await
        .iter()
        .map(|event| event.name().to_owned())
        .collect();
    assert_eq!(
        names,
        vec!["record.created", "record.updated", "record.deleted"]
    );
}

#[tokio::test]
async fn reader_cannot_mutate() {
    let harness = harness();
    let result = harness
        .service
        .create_record(&actor("reader"), "note", json!({}))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.events.events.lock().await.is_empty());
}

#[tokio::test]
async fn resource_without_writer_rejects_mutations() {
    let harness = harness();
    let result = harness
        .service
        .create_record(&actor("admin"), "report", json!({}))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn data_must_be_an_object_without_reserved_id() {
    let harness = harness();
    let not_object = harness
        .service
        .create_record(&actor("admin"), "note", json!([1, 2]))
        .await;
    let reserved = harness
        .service
        .create_record(&actor("admin"), "note", json!({"id": "x"}))
        .await;

    assert!(matches!(not_object, Err(AppError::Validation(_))));
    assert!(matches!(reserved, Err(AppError::Validation(_))));
}
