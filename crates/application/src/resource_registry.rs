use std::collections::BTreeMap;
use std::sync::Arc;

use quire_core::{AppError, AppResult};
use quire_domain::ResourceDefinition;

use crate::{RecordStore, RecordWriteStore, ResourcePolicy};

/// One resource type with its declaration, backends and policy.
#[derive(Clone)]
pub struct RegisteredResource {
    definition: ResourceDefinition,
    store: Arc<dyn RecordStore>,
    writer: Option<Arc<dyn RecordWriteStore>>,
    policy: Arc<dyn ResourcePolicy>,
}

impl RegisteredResource {
    /// Binds a read-only resource.
    #[must_use]
    pub fn new(
        definition: ResourceDefinition,
        store: Arc<dyn RecordStore>,
        policy: Arc<dyn ResourcePolicy>,
    ) -> Self {
        Self {
            definition,
            store,
            writer: None,
            policy,
        }
    }

    /// Enables mutations through the given write store.
    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn RecordWriteStore>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Returns the static declaration.
    #[must_use]
    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    /// Returns the read backend.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Returns the write backend, when mutations are enabled.
    #[must_use]
    pub fn writer(&self) -> Option<&Arc<dyn RecordWriteStore>> {
        self.writer.as_ref()
    }

    /// Returns the authorization policy.
    #[must_use]
    pub fn policy(&self) -> &Arc<dyn ResourcePolicy> {
        &self.policy
    }
}

/// Startup-time catalog of resource types. Immutable once shared.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, RegisteredResource>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource after validating its declaration.
    pub fn register(&mut self, resource: RegisteredResource) -> AppResult<()> {
        resource.definition.validate()?;

        let resource_type = resource.definition.resource_type().to_owned();
        for association in resource.definition.associations() {
            let target = association.target_resource_type();
            if target != resource_type && !self.resources.contains_key(target) {
                return Err(AppError::Configuration(format!(
                    "resource '{resource_type}' association '{}' targets unregistered resource '{target}'",
                    association.name()
                )));
            }
        }

        if self.resources.contains_key(&resource_type) {
            return Err(AppError::Configuration(format!(
                "resource '{resource_type}' is registered more than once"
            )));
        }

        self.resources.insert(resource_type, resource);
        Ok(())
    }

    /// Looks up a resource type.
    pub fn get(&self, resource_type: &str) -> AppResult<&RegisteredResource> {
        self.resources.get(resource_type).ok_or_else(|| {
            AppError::NotFound(format!("resource type '{resource_type}' does not exist"))
        })
    }

    /// Lists registered resource declarations ordered by type.
    #[must_use]
    pub fn definitions(&self) -> Vec<&ResourceDefinition> {
        self.resources
            .values()
            .map(RegisteredResource::definition)
            .collect()
    }
}
