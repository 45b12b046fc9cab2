use quire_domain::SearchableFieldSet;

use crate::{Dataset, RecordConditionGroup, RecordConditionNode, RecordFilter};

/// Intersects the dataset with an OR of case-insensitive substring matches.
///
/// Returns the dataset untouched when the search text is absent or no field is searchable.
#[must_use]
pub fn apply_search(dataset: Dataset, fields: &SearchableFieldSet, query: Option<&str>) -> Dataset {
    let Some(query) = query.filter(|query| !query.is_empty()) else {
        return dataset;
    };
    if fields.is_empty() {
        return dataset;
    }

    let predicates = fields
        .iter()
        .map(|field| RecordConditionNode::Filter(RecordFilter::contains_ignore_case(field, query)))
        .collect();

    dataset.narrow(RecordConditionNode::Group(RecordConditionGroup::any(
        predicates,
    )))
}
