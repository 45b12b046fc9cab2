use quire_core::{AppResult, UserIdentity};
use quire_domain::{
    AUDIT_LOG_RESOURCE_TYPE, AuditLogEntry, FilterSpec, ResourceDefinition, ResourceSort,
    SearchableFieldSet, SortDirection,
};

use crate::{ListParams, Page, QueryService};

/// Read-only access to the audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    query_service: QueryService,
}

impl AuditLogService {
    /// Creates the service over the shared query pipeline.
    #[must_use]
    pub fn new(query_service: QueryService) -> Self {
        Self { query_service }
    }

    /// Declaration of the audit log resource: list-only, newest first.
    pub fn resource_definition() -> AppResult<ResourceDefinition> {
        Ok(
            ResourceDefinition::new(AUDIT_LOG_RESOURCE_TYPE, "Audit log")?
                .with_filter(FilterSpec::new("action")?)
                .with_searchable_fields(SearchableFieldSet::new(["action", "user"])?)
                .with_default_sort(ResourceSort::new("created_at", SortDirection::Desc)?)
                .list_only(),
        )
    }

    /// Lists audit entries visible to the actor, most recent first.
    pub async fn list(
        &self,
        actor: &UserIdentity,
        params: &ListParams,
    ) -> AppResult<Page<AuditLogEntry>> {
        self.query_service
            .list(actor, AUDIT_LOG_RESOURCE_TYPE, params)
            .await?
            .try_map(|record| AuditLogEntry::try_from(&record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use quire_core::{AppError, AppResult, UserIdentity};
    use quire_domain::{AuditLogEntry, Permission, Record};
    use serde_json::json;

    use crate::{
        AuthorizationRepository, AuthorizationService, ListParams, PermissionResourcePolicy,
        QueryService, RecordQuery, RecordStore, RecordWindow, RegisteredResource,
        ResourceRegistry, sort_records,
    };

    use super::AuditLogService;

    struct FakeAuditRecordStore {
        records: Vec<Record>,
    }

    #[async_trait]
    impl RecordStore for FakeAuditRecordStore {
        async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
            Ok(self.records.iter().filter(|record| query.matches(record)).count())
        }

        async fn query_records(
            &self,
            query: &RecordQuery,
            window: Option<RecordWindow>,
        ) -> AppResult<Vec<Record>> {
            let mut records: Vec<Record> = self
                .records
                .iter()
                .filter(|record| query.matches(record))
                .cloned()
                .collect();
            sort_records(&mut records, &query.sort);
            let window = window.unwrap_or(RecordWindow {
                offset: 0,
                limit: usize::MAX,
            });
            Ok(records
                .into_iter()
                .skip(window.offset)
                .take(window.limit)
                .collect())
        }
    }

    struct FakeAuthorizationRepository;

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<Permission>> {
            Ok(match subject {
                "auditor" => vec![Permission::AuditRead],
                _ => vec![Permission::RecordRead, Permission::RecordScopeAll],
            })
        }
    }

    fn service() -> AuditLogService {
        let base = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        let records = ["user.login", "record.created", "user.logout"]
            .iter()
            .enumerate()
            .map(|(offset, action)| {
                AuditLogEntry::new(
                    *action,
                    Some(json!("alice")),
                    None,
                    base + Duration::seconds(i64::try_from(offset).unwrap_or_default()),
                )
                .and_then(|entry| entry.to_record())
                .unwrap_or_else(|_| unreachable!())
            })
            .collect();

        let authorization_service =
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository));
        let mut registry = ResourceRegistry::new();
        registry
            .register(RegisteredResource::new(
                AuditLogService::resource_definition().unwrap_or_else(|_| unreachable!()),
                Arc::new(FakeAuditRecordStore { records }),
                Arc::new(PermissionResourcePolicy::audit_log(authorization_service)),
            ))
            .unwrap_or_else(|_| unreachable!());

        AuditLogService::new(QueryService::new(Arc::new(registry)))
    }

    fn actor(subject: &str) -> UserIdentity {
        UserIdentity::new(subject, subject)
    }

    #[tokio::test]
    async fn entries_are_listed_newest_first() {
        let page = service()
            .list(&actor("auditor"), &ListParams::new())
            .await
            .unwrap_or_else(|_| unreachable!());

        let actions: Vec<&str> = page.items.iter().map(AuditLogEntry::action).collect();
        assert_eq!(actions, vec!["user.logout", "record.created", "user.login"]);
    }

    #[tokio::test]
    async fn entries_filter_by_action() {
        let page = service()
            .list(
                &actor("auditor"),
                &ListParams::new().with("action", "user.login"),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].user(), Some(&json!("alice")));
    }

    #[tokio::test]
    async fn record_readers_cannot_see_the_audit_log() {
        let result = service().list(&actor("editor"), &ListParams::new()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
