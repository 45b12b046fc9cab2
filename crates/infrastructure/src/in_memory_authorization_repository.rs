use std::collections::HashMap;

use async_trait::async_trait;
use quire_application::AuthorizationRepository;
use quire_core::AppResult;
use quire_domain::Permission;

/// Static subject-to-permission grants loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthorizationRepository {
    grants: HashMap<String, Vec<Permission>>,
}

impl InMemoryAuthorizationRepository {
    /// Creates a repository without grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds permissions for a subject, keeping earlier grants.
    #[must_use]
    pub fn with_grant(
        mut self,
        subject: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        let granted = self.grants.entry(subject.into()).or_default();
        for permission in permissions {
            if !granted.contains(&permission) {
                granted.push(permission);
            }
        }
        self
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
        Ok(self.grants.get(subject).cloned().unwrap_or_default())
    }
}
