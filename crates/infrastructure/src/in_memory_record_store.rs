use async_trait::async_trait;
use quire_application::{RecordQuery, RecordStore, RecordWindow, RecordWriteStore, sort_records};
use quire_core::{AppError, AppResult};
use quire_domain::Record;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory record store keeping insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record with a caller-chosen identifier.
    pub async fn insert(&self, record: Record) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|stored| {
            stored.resource_type() == record.resource_type()
                && stored.record_id() == record.record_id()
        }) {
            return Err(AppError::Conflict(format!(
                "record '{}' of resource '{}' already exists",
                record.record_id(),
                record.resource_type()
            )));
        }

        records.push(record);
        Ok(())
    }
}

/// Filters, orders and windows records the way the SQL adapters do.
pub(crate) fn select_records<'a>(
    records: impl Iterator<Item = &'a Record>,
    query: &RecordQuery,
    window: Option<RecordWindow>,
) -> Vec<Record> {
    let mut selected: Vec<Record> = records
        .filter(|record| query.matches(record))
        .cloned()
        .collect();
    sort_records(&mut selected, &query.sort);

    match window {
        Some(window) => selected
            .into_iter()
            .skip(window.offset)
            .take(window.limit)
            .collect(),
        None => selected,
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|record| query.matches(record)).count())
    }

    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>> {
        let records = self.records.read().await;
        Ok(select_records(records.iter(), query, window))
    }
}

#[async_trait]
impl RecordWriteStore for InMemoryRecordStore {
    async fn create_record(&self, resource_type: &str, data: Value) -> AppResult<Record> {
        let record = Record::new(Uuid::new_v4().to_string(), resource_type, data)?;
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        resource_type: &str,
        record_id: &str,
        data: Value,
    ) -> AppResult<Record> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|record| {
                record.resource_type().as_str() == resource_type
                    && record.record_id().as_str() == record_id
            })
            .ok_or_else(|| missing(resource_type, record_id))?;

        *slot = Record::new(record_id, resource_type, data)?;
        Ok(slot.clone())
    }

    async fn delete_record(&self, resource_type: &str, record_id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| {
            record.resource_type().as_str() != resource_type
                || record.record_id().as_str() != record_id
        });

        if records.len() == before {
            return Err(missing(resource_type, record_id));
        }

        Ok(())
    }
}

fn missing(resource_type: &str, record_id: &str) -> AppError {
    AppError::NotFound(format!(
        "record '{record_id}' of resource '{resource_type}' does not exist"
    ))
}

#[cfg(test)]
mod tests {
    use quire_application::{
        RecordConditionNode, RecordFilter, RecordQuery, RecordStore, RecordWindow,
        RecordWriteStore,
    };
    use quire_core::AppError;
    use quire_domain::{Record, ResourceSort, SortDirection};
    use serde_json::json;

    use super::InMemoryRecordStore;

    async fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        for (id, rank) in [("a", 2), ("b", 1), ("c", 3)] {
            let record = Record::new(id, "item", json!({"rank": rank, "tag": "x"}))
                .unwrap_or_else(|_| unreachable!());
            assert!(store.insert(record).await.is_ok());
        }
        let other = Record::new("z", "other", json!({"tag": "x"})).unwrap_or_else(|_| unreachable!());
        assert!(store.insert(other).await.is_ok());
        store
    }

    #[tokio::test]
    async fn queries_are_scoped_to_the_resource_type() {
        let store = seeded().await;
        let query = RecordQuery::for_resource("item").narrowed(RecordConditionNode::Filter(
            RecordFilter::equals("tag", json!("x")),
        ));

        assert_eq!(store.count_records(&query).await.ok(), Some(3));
    }

    #[tokio::test]
    async fn windows_apply_after_sorting() {
        let store = seeded().await;
        let mut query = RecordQuery::for_resource("item");
        query.sort =
            vec![ResourceSort::new("rank", SortDirection::Asc).unwrap_or_else(|_| unreachable!())];

        let records = store
            .query_records(&query, Some(RecordWindow { offset: 1, limit: 1 }))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id().as_str(), "a");
    }

    #[tokio::test]
    async fn natural_order_is_insertion_order() {
        let store = seeded().await;
        let records = store
            .query_records(&RecordQuery::for_resource("item"), None)
            .await
            .unwrap_or_else(|_| unreachable!());

        let ids: Vec<&str> = records
            .iter()
            .map(|record| record.record_id().as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn write_lifecycle() {
        let store = InMemoryRecordStore::new();
        let created = store
            .create_record("item", json!({"rank": 1}))
            .await
            .unwrap_or_else(|_| unreachable!());
        let record_id = created.record_id().as_str().to_owned();

        let updated = store
            .update_record("item", &record_id, json!({"rank": 5}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.field("rank"), Some(json!(5)));

        assert!(store.delete_record("item", &record_id).await.is_ok());
        let missing = store.delete_record("item", &record_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = seeded().await;
        let duplicate = Record::new("a", "item", json!({})).unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            store.insert(duplicate).await,
            Err(AppError::Conflict(_))
        ));
    }
}
