use async_trait::async_trait;
use quire_core::AppResult;
use quire_domain::{Record, ResourceSort};
use serde_json::Value;

mod evaluation;

pub use evaluation::{compare_field_values, sort_records};

/// Logical composition mode for query conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLogicalMode {
    /// Every condition must match.
    And,
    /// Any condition may match.
    Or,
}

/// Record query comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOperator {
    /// JSON equality.
    Eq,
    /// Case-insensitive literal substring match on string values.
    ContainsIgnoreCase,
    /// Field holds the identifier of a related record. A null reference never matches.
    References,
}

/// Typed condition for record queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    /// Field name to compare.
    pub field_name: String,
    /// Comparison operator.
    pub operator: RecordOperator,
    /// Expected field value.
    pub field_value: Value,
}

impl RecordFilter {
    /// Exact-match condition.
    #[must_use]
    pub fn equals(field_name: impl Into<String>, field_value: Value) -> Self {
        Self {
            field_name: field_name.into(),
            operator: RecordOperator::Eq,
            field_value,
        }
    }

    /// Case-insensitive substring condition.
    #[must_use]
    pub fn contains_ignore_case(field_name: impl Into<String>, needle: &str) -> Self {
        Self {
            field_name: field_name.into(),
            operator: RecordOperator::ContainsIgnoreCase,
            field_value: Value::String(needle.to_owned()),
        }
    }

    /// Identity condition against a related record; `None` never matches.
    #[must_use]
    pub fn references(foreign_key: impl Into<String>, record_id: Option<&str>) -> Self {
        Self {
            field_name: foreign_key.into(),
            operator: RecordOperator::References,
            field_value: record_id
                .map(|record_id| Value::String(record_id.to_owned()))
                .unwrap_or(Value::Null),
        }
    }
}

/// Recursive record query condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordConditionNode {
    /// One typed condition.
    Filter(RecordFilter),
    /// Nested logical group.
    Group(RecordConditionGroup),
}

/// Logical group of conditions. An empty `And` group matches everything,
/// an empty `Or` group matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordConditionGroup {
    /// Logical mode for evaluating child nodes.
    pub logical_mode: RecordLogicalMode,
    /// Child condition nodes.
    pub nodes: Vec<RecordConditionNode>,
}

impl RecordConditionGroup {
    /// Conjunction of the given nodes.
    #[must_use]
    pub fn all(nodes: Vec<RecordConditionNode>) -> Self {
        Self {
            logical_mode: RecordLogicalMode::And,
            nodes,
        }
    }

    /// Disjunction of the given nodes.
    #[must_use]
    pub fn any(nodes: Vec<RecordConditionNode>) -> Self {
        Self {
            logical_mode: RecordLogicalMode::Or,
            nodes,
        }
    }
}

impl Default for RecordConditionGroup {
    fn default() -> Self {
        Self::all(Vec::new())
    }
}

/// Lazily evaluated query against one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    /// Queried resource type.
    pub resource_type: String,
    /// Conjunctive where-clause; every narrowing step appends to it.
    pub where_clause: RecordConditionGroup,
    /// Sort instructions; empty means store order.
    pub sort: Vec<ResourceSort>,
}

impl RecordQuery {
    /// Unrestricted query over every record of a type.
    #[must_use]
    pub fn for_resource(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            where_clause: RecordConditionGroup::default(),
            sort: Vec::new(),
        }
    }

    /// Appends a condition to the where-clause.
    #[must_use]
    pub fn narrowed(mut self, node: RecordConditionNode) -> Self {
        self.where_clause.nodes.push(node);
        self
    }

    /// Returns whether a record satisfies this query's conditions.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record.resource_type().as_str() == self.resource_type && self.where_clause.matches(record)
    }
}

/// Offset/limit window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordWindow {
    /// Number of rows skipped.
    pub offset: usize,
    /// Maximum rows returned.
    pub limit: usize,
}

/// Read port of a record backend: counting and windowed fetching.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Counts records matching a query.
    async fn count_records(&self, query: &RecordQuery) -> AppResult<usize>;

    /// Fetches matching records in query order, optionally windowed.
    async fn query_records(
        &self,
        query: &RecordQuery,
        window: Option<RecordWindow>,
    ) -> AppResult<Vec<Record>>;
}

/// Write port of a record backend.
#[async_trait]
pub trait RecordWriteStore: Send + Sync {
    /// Persists a new record and returns it with its assigned identifier.
    async fn create_record(&self, resource_type: &str, data: Value) -> AppResult<Record>;

    /// Replaces the data of an existing record.
    async fn update_record(
        &self,
        resource_type: &str,
        record_id: &str,
        data: Value,
    ) -> AppResult<Record>;

    /// Deletes an existing record.
    async fn delete_record(&self, resource_type: &str, record_id: &str) -> AppResult<()>;
}
