use async_trait::async_trait;
use quire_application::{AuditLogRepository, RecordQuery, RecordStore, RecordWindow};
use quire_core::AppResult;
use quire_domain::{AuditLogEntry, Record};
use tokio::sync::RwLock;

use crate::in_memory_record_store::select_records;

/// Append-only in-memory audit trail, also queryable as `audit_log` records.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all entries in write order.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    async fn records(&self) -> AppResult<Vec<Record>> {
        self.entries
            .read()
            .await
            .iter()
            .map(AuditLogEntry::to_record)
            .collect()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogStore {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryAuditLogStore {
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
        let records = self.records().await?;
        Ok(records.iter().filter(|record| query.matches(record)).count())
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>> {
        let records = self.records().await?;
        Ok(select_records(records.iter(), query, window))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use quire_application::{AuditLogRepository, RecordQuery, RecordStore};
    use quire_domain::{AUDIT_LOG_RESOURCE_TYPE, AuditLogEntry, ResourceSort, SortDirection};
    use serde_json::json;

    use super::InMemoryAuditLogStore;

    #[tokio::test]
    async fn appended_entries_are_queryable_newest_first() {
        let store = InMemoryAuditLogStore::new();
        let base = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        for (offset, action) in ["user.login", "user.logout"].iter().enumerate() {
            let entry = AuditLogEntry::new(
                *action,
                Some(json!("alice")),
                None,
                base + Duration::milliseconds(i64::try_from(offset).unwrap_or_default()),
            )
            .unwrap_or_else(|_| unreachable!());
            assert!(store.append_entry(entry).await.is_ok());
        }

        let mut query = RecordQuery::for_resource(AUDIT_LOG_RESOURCE_TYPE);
        query.sort = vec![
            ResourceSort::new("created_at", SortDirection::Desc)
                .unwrap_or_else(|_| unreachable!()),
        ];
        let records = store
            .query_records(&query, None)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field("action"), Some(json!("user.logout")));
        assert_eq!(store.entries().await[0].action(), "user.login");
    }
}
