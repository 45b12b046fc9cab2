use std::sync::Arc;

use quire_core::{AppError, AppResult, UserIdentity};
use quire_domain::{FrameworkEvent, RECORD_ID_FIELD, Record, ResourceAction, ResourceExposure};
use serde_json::{Value, json};

use crate::{EventBus, QueryService, RecordWriteStore, RegisteredResource};

#[cfg(test)]
mod tests;

/// Application service for record mutations.
///
/// Every successful mutation is broadcast on the event bus after it is persisted.
#[derive(Clone)]
pub struct RecordCommandService {
    query_service: QueryService,
    event_bus: Arc<EventBus>,
}

impl RecordCommandService {
    /// Creates the service.
    #[must_use]
    pub fn new(query_service: QueryService, event_bus: Arc<EventBus>) -> Self {
        Self {
            query_service,
            event_bus,
        }
    }

    /// Creates a record.
    pub async fn create_record(
        &self,
        actor: &UserIdentity,
        resource_type: &str,
        data: Value,
    ) -> AppResult<Record> {
        validate_data(&data)?;
        let (resource, writer) = self.writable(resource_type)?;
        resource
            .policy()
            .authorize(actor, ResourceAction::Create)
            .await?;

        let record = writer.create_record(resource_type, data).await?;
        self.publish(
            FrameworkEvent::RecordCreated,
            actor,
            resource_type,
            record.record_id().as_str(),
        )
        .await;
        Ok(record)
    }

    /// Replaces the data of a record within the actor's scope.
    pub async fn update_record(
        &self,
        actor: &UserIdentity,
        resource_type: &str,
        record_id: &str,
        data: Value,
    ) -> AppResult<Record> {
        validate_data(&data)?;
        let (resource, writer) = self.writable(resource_type)?;
        resource
            .policy()
            .authorize(actor, ResourceAction::Update)
            .await?;
        self.require_in_scope(actor, resource, record_id).await?;

        let record = writer
            .update_record(resource_type, record_id, data)
            .await?;
        self.publish(FrameworkEvent::RecordUpdated, actor, resource_type, record_id)
            .await;
        Ok(record)
    }

    /// Deletes a record within the actor's scope.
    pub async fn delete_record(
        &self,
        actor: &UserIdentity,
        resource_type: &str,
        record_id: &str,
    ) -> AppResult<()> {
        let (resource, writer) = self.writable(resource_type)?;
        resource
            .policy()
            .authorize(actor, ResourceAction::Delete)
            .await?;
        self.require_in_scope(actor, resource, record_id).await?;

        writer.delete_record(resource_type, record_id).await?;
        self.publish(FrameworkEvent::RecordDeleted, actor, resource_type, record_id)
            .await;
        Ok(())
    }

    fn writable(
        &self,
        resource_type: &str,
    ) -> AppResult<(&RegisteredResource, &Arc<dyn RecordWriteStore>)> {
        let resource = self.query_service.registry().get(resource_type)?;
        if resource.definition().exposure() == ResourceExposure::ListOnly {
            return Err(read_only(resource_type));
        }

        let writer = resource
            .writer()
            .ok_or_else(|| read_only(resource_type))?;
        Ok((resource, writer))
    }

    async fn require_in_scope(
        &self,
        actor: &UserIdentity,
        resource: &RegisteredResource,
        record_id: &str,
    ) -> AppResult<()> {
        match self
            .query_service
            .find_in_scope(actor, resource, record_id)
            .await?
        {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!(
                "record '{record_id}' of resource '{}' does not exist",
                resource.definition().resource_type()
            ))),
        }
    }

    async fn publish(
        &self,
        event: FrameworkEvent,
        actor: &UserIdentity,
        resource_type: &str,
        record_id: &str,
    ) {
        self.event_bus
            .publish(
                event,
                Some(json!({
                    "user": actor.subject(),
                    "details": {
                        "resource_type": resource_type,
                        "record_id": record_id,
                    },
                })),
            )
            .await;
    }
}

fn validate_data(data: &Value) -> AppResult<()> {
    let Some(fields) = data.as_object() else {
        return Err(AppError::Validation(
            "record data must be a JSON object".to_owned(),
        ));
    };

    if fields.contains_key(RECORD_ID_FIELD) {
        return Err(AppError::Validation(format!(
            "record data must not contain the reserved field '{RECORD_ID_FIELD}'"
        )));
    }

    Ok(())
}

fn read_only(resource_type: &str) -> AppError {
    AppError::NotFound(format!(
        "resource '{resource_type}' does not accept mutations"
    ))
}
