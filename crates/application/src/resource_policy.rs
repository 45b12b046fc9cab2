use async_trait::async_trait;
use quire_core::{AppResult, UserIdentity};
use quire_domain::{Permission, ResourceAction};
use serde_json::Value;

use crate::{AuthorizationService, Dataset, RecordConditionNode, RecordFilter};

/// Per-resource-type authorization policy.
#[async_trait]
pub trait ResourcePolicy: Send + Sync {
    /// Rejects actions the actor may not perform at all. Runs before any data access.
    async fn authorize(&self, actor: &UserIdentity, action: ResourceAction) -> AppResult<()>;

    /// Narrows a dataset to what the actor may see. Never widens it.
    async fn scope(&self, actor: &UserIdentity, dataset: Dataset) -> AppResult<Dataset>;
}

/// Permission-driven policy shared by most resource types.
///
/// Actors holding the unrestricted permission see everything. Other actors see
/// the records they own when an owner field is configured, and nothing otherwise.
#[derive(Clone)]
pub struct PermissionResourcePolicy {
    authorization_service: AuthorizationService,
    read_permission: Permission,
    write_permission: Permission,
    unrestricted_permission: Permission,
    owner_field: Option<String>,
}

impl PermissionResourcePolicy {
    /// Policy using the generic record permissions.
    #[must_use]
    pub fn records(authorization_service: AuthorizationService) -> Self {
        Self {
            authorization_service,
            read_permission: Permission::RecordRead,
            write_permission: Permission::RecordWrite,
            unrestricted_permission: Permission::RecordScopeAll,
            owner_field: None,
        }
    }

    /// Policy for the audit log: readers see every entry, nobody writes.
    #[must_use]
    pub fn audit_log(authorization_service: AuthorizationService) -> Self {
        Self {
            authorization_service,
            read_permission: Permission::AuditRead,
            write_permission: Permission::AuditRead,
            unrestricted_permission: Permission::AuditRead,
            owner_field: None,
        }
    }

    /// Scopes non-privileged actors to records whose `field` equals their subject.
    #[must_use]
    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }
}

#[async_trait]
impl ResourcePolicy for PermissionResourcePolicy {
    async fn authorize(&self, actor: &UserIdentity, action: ResourceAction) -> AppResult<()> {
        let permission = if action.is_mutation() {
            self.write_permission
        } else {
            self.read_permission
        };

        self.authorization_service
            .require_permission(actor.subject(), permission)
            .await
    }

    async fn scope(&self, actor: &UserIdentity, dataset: Dataset) -> AppResult<Dataset> {
        if self
            .authorization_service
            .has_permission(actor.subject(), self.unrestricted_permission)
            .await?
        {
            return Ok(dataset);
        }

        Ok(match self.owner_field.as_deref() {
            Some(owner_field) => dataset.narrow(RecordConditionNode::Filter(RecordFilter::equals(
                owner_field,
                Value::String(actor.subject().to_owned()),
            ))),
            None => Dataset::empty(),
        })
    }
}
