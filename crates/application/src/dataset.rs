use quire_domain::{Record, ResourceSort};

use crate::{RecordConditionNode, RecordQuery, sort_records};

/// Candidate record collection flowing through the query pipeline.
///
/// Narrowing a `Query` only extends its where-clause; nothing is fetched until
/// pagination. `Materialized` holds records already in memory, typically produced
/// by a scope policy that resolved to a fixed (often empty) set.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Not yet materialized, countable and sliceable through a record store.
    Query(RecordQuery),
    /// Already materialized sequence.
    Materialized(Vec<Record>),
}

impl Dataset {
    /// Unrestricted lazy dataset over one resource type.
    #[must_use]
    pub fn query(resource_type: impl Into<String>) -> Self {
        Self::Query(RecordQuery::for_resource(resource_type))
    }

    /// Dataset that contains nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::Materialized(Vec::new())
    }

    /// Intersects the dataset with a condition.
    #[must_use]
    pub fn narrow(self, node: RecordConditionNode) -> Self {
        match self {
            Self::Query(query) => Self::Query(query.narrowed(node)),
            Self::Materialized(records) => Self::Materialized(
                records
                    .into_iter()
                    .filter(|record| node.matches(record))
                    .collect(),
            ),
        }
    }

    /// Applies an ordering without changing membership. Empty instructions keep the current order.
    #[must_use]
    pub fn ordered(self, sort: &[ResourceSort]) -> Self {
        if sort.is_empty() {
            return self;
        }

        match self {
            Self::Query(mut query) => {
                query.sort = sort.to_vec();
                Self::Query(query)
            }
            Self::Materialized(mut records) => {
                sort_records(&mut records, sort);
                Self::Materialized(records)
            }
        }
    }

    /// Returns whether records are already in memory.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }
}
