use std::sync::Arc;

use async_trait::async_trait;
use quire_core::{AppError, AppResult};
use quire_domain::Permission;

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists effective permissions for a subject.
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>>;
}

/// Application service for permission checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Ensures a subject has the required permission.
    pub async fn require_permission(&self, subject: &str, permission: Permission) -> AppResult<()> {
        if self.has_permission(subject, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{subject}' is missing permission '{}'",
            permission.as_str()
        )))
    }

    /// Returns whether the subject currently has the permission.
    pub async fn has_permission(&self, subject: &str, permission: Permission) -> AppResult<bool> {
        let permissions = self
            .repository
            .list_permissions_for_subject(subject)
            .await?;

        Ok(permissions.iter().any(|value| value == &permission))
    }
}
