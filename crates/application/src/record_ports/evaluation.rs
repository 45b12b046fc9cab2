use std::cmp::Ordering;

use quire_domain::{Record, ResourceSort, SortDirection};
use serde_json::{Number, Value};

use super::{
    RecordConditionGroup, RecordConditionNode, RecordFilter, RecordLogicalMode, RecordOperator,
};

impl RecordConditionGroup {
    /// Evaluates the group against an in-memory record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let evaluate = |node: &RecordConditionNode| node.matches(record);

        match self.logical_mode {
            RecordLogicalMode::And => self.nodes.iter().all(evaluate),
            RecordLogicalMode::Or => self.nodes.iter().any(evaluate),
        }
    }
}

impl RecordConditionNode {
    /// Evaluates the node against an in-memory record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Filter(filter) => filter.matches(record),
            Self::Group(group) => group.matches(record),
        }
    }
}

impl RecordFilter {
    /// Evaluates the condition against an in-memory record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(value) = record.field(self.field_name.as_str()) else {
            return false;
        };

        match self.operator {
            RecordOperator::Eq => json_values_equal(&value, &self.field_value),
            RecordOperator::ContainsIgnoreCase => value
                .as_str()
                .zip(self.field_value.as_str())
                .map(|(stored, needle)| stored.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            RecordOperator::References => self
                .field_value
                .as_str()
                .zip(value.as_str())
                .map(|(referenced, stored)| referenced == stored)
                .unwrap_or(false),
        }
    }
}

fn json_values_equal(stored: &Value, expected: &Value) -> bool {
    match (stored, expected) {
        (Value::Number(left), Value::Number(right)) => {
            compare_numbers(left, right) == Some(Ordering::Equal)
        }
        _ => stored == expected,
    }
}

/// Integers compare exactly; floats only when either side is one.
fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }
    if left.is_f64() || right.is_f64() {
        return left
            .as_f64()
            .zip(right.as_f64())
            .and_then(|(left, right)| left.partial_cmp(&right));
    }

    // A negative i64 against a u64 above i64::MAX.
    Some(if left.is_i64() {
        Ordering::Less
    } else {
        Ordering::Greater
    })
}

/// Orders two optional field values. Missing and null values sort last.
#[must_use]
pub fn compare_field_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|value| !value.is_null());
    let right = right.filter(|value| !value.is_null());

    match (left, right) {
        (Some(left), Some(right)) => match (left, right) {
            (Value::Number(left), Value::Number(right)) => {
                compare_numbers(left, right).unwrap_or(Ordering::Equal)
            }
            (Value::String(left), Value::String(right)) => left.cmp(right),
            (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
            _ => left.to_string().cmp(&right.to_string()),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable in-memory sort by the given instructions.
pub fn sort_records(records: &mut [Record], sort: &[ResourceSort]) {
    if sort.is_empty() {
        return;
    }

    records.sort_by(|left, right| {
        for instruction in sort {
            let left_value = left.field(instruction.field_name());
            let right_value = right.field(instruction.field_name());
            let mut ordering = compare_field_values(left_value.as_ref(), right_value.as_ref());
            if instruction.direction() == SortDirection::Desc {
                ordering = ordering.reverse();
            }

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}
