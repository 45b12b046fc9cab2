use std::collections::BTreeSet;

use quire_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Conversion applied to a raw request parameter before it is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterModifier {
    /// Keeps the raw string value.
    #[default]
    Text,
    /// Parses a signed integer.
    Integer,
    /// Parses a finite floating point number.
    Float,
    /// Parses `true`/`false`, `1`/`0` or `yes`/`no`.
    Boolean,
}

impl FilterModifier {
    /// Converts a raw parameter value. Failures name the parameter.
    pub fn convert(&self, parameter: &str, raw: &str) -> AppResult<Value> {
        match self {
            Self::Text => Ok(Value::String(raw.to_owned())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| AppError::invalid_parameter(parameter, "expected an integer")),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| AppError::invalid_parameter(parameter, "expected a number")),
            Self::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(AppError::invalid_parameter(parameter, "expected a boolean")),
            },
        }
    }
}

/// Resolved comparison target of a filter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget<'a> {
    /// Field on the resource's own records.
    Field(&'a str),
    /// Field on a record reached through one association hop.
    Association {
        /// Association name declared on the owning resource.
        association: &'a str,
        /// Field compared on the associated record.
        target_field: &'a str,
    },
}

/// Declared exact-match filter bound to one request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    name: NonEmptyString,
    field: Option<NonEmptyString>,
    modifier: FilterModifier,
}

impl FilterSpec {
    /// Creates a filter comparing the parameter `name` against the field of the same name.
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            field: None,
            modifier: FilterModifier::Text,
        })
    }

    /// Overrides the compared field. `association.field` traverses one association.
    pub fn with_field(mut self, field: impl Into<String>) -> AppResult<Self> {
        self.field = Some(NonEmptyString::new(field)?);
        Ok(self)
    }

    /// Overrides the value conversion.
    #[must_use]
    pub fn with_modifier(mut self, modifier: FilterModifier) -> Self {
        self.modifier = modifier;
        self
    }

    /// Returns the request parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the compared field, defaulting to the parameter name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field
            .as_ref()
            .map(NonEmptyString::as_str)
            .unwrap_or_else(|| self.name.as_str())
    }

    /// Returns the value conversion.
    #[must_use]
    pub fn modifier(&self) -> FilterModifier {
        self.modifier
    }

    /// Splits the field into its comparison target.
    pub fn target(&self) -> AppResult<FilterTarget<'_>> {
        let field = self.field();
        let Some((association, target_field)) = field.split_once('.') else {
            return Ok(FilterTarget::Field(field));
        };

        if association.is_empty() || target_field.is_empty() || target_field.contains('.') {
            return Err(AppError::Configuration(format!(
                "filter '{}' field '{}' must reference at most one association hop",
                self.name(),
                field
            )));
        }

        Ok(FilterTarget::Association {
            association,
            target_field,
        })
    }
}

/// Declared relation from one resource type to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    name: NonEmptyString,
    target_resource_type: NonEmptyString,
    foreign_key: NonEmptyString,
}

impl Association {
    /// Creates an association where `foreign_key` on the owning record stores the target id.
    pub fn new(
        name: impl Into<String>,
        target_resource_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            target_resource_type: NonEmptyString::new(target_resource_type)?,
            foreign_key: NonEmptyString::new(foreign_key)?,
        })
    }

    /// Returns the association name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the associated resource type.
    #[must_use]
    pub fn target_resource_type(&self) -> &str {
        self.target_resource_type.as_str()
    }

    /// Returns the join key on the owning record.
    #[must_use]
    pub fn foreign_key(&self) -> &str {
        self.foreign_key.as_str()
    }
}

/// Ordered set of fields included in free-text search. Empty disables search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchableFieldSet(Vec<NonEmptyString>);

impl SearchableFieldSet {
    /// Creates a field set, keeping the first occurrence of duplicates.
    pub fn new<I, S>(fields: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for field in fields {
            let field = NonEmptyString::new(field)?;
            if seen.insert(field.clone()) {
                ordered.push(field);
            }
        }

        Ok(Self(ordered))
    }

    /// Returns whether search is disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates field names in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(NonEmptyString::as_str)
    }
}

/// Sort direction for resource ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// One sort instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSort {
    field_name: NonEmptyString,
    direction: SortDirection,
}

impl ResourceSort {
    /// Creates a validated sort instruction.
    pub fn new(field_name: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            field_name: NonEmptyString::new(field_name)?,
            direction,
        })
    }

    /// Returns the sorted field.
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.field_name.as_str()
    }

    /// Returns the sort direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Operations a resource exposes to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceExposure {
    /// List, read and mutate.
    #[default]
    Full,
    /// Listing only; single reads and mutations are hidden.
    ListOnly,
}

/// Static declaration of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    resource_type: NonEmptyString,
    display_name: NonEmptyString,
    associations: Vec<Association>,
    filters: Vec<FilterSpec>,
    searchable_fields: SearchableFieldSet,
    default_sort: Vec<ResourceSort>,
    exposure: ResourceExposure,
}

impl ResourceDefinition {
    /// Creates a resource declaration without filters, search or associations.
    pub fn new(
        resource_type: impl Into<String>,
        display_name: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            resource_type: NonEmptyString::new(resource_type)?,
            display_name: NonEmptyString::new(display_name)?,
            associations: Vec::new(),
            filters: Vec::new(),
            searchable_fields: SearchableFieldSet::default(),
            default_sort: Vec::new(),
            exposure: ResourceExposure::Full,
        })
    }

    /// Adds an association.
    #[must_use]
    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// Adds a filter; filters apply in declaration order.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replaces the searchable field set.
    #[must_use]
    pub fn with_searchable_fields(mut self, fields: SearchableFieldSet) -> Self {
        self.searchable_fields = fields;
        self
    }

    /// Appends a default sort instruction.
    #[must_use]
    pub fn with_default_sort(mut self, sort: ResourceSort) -> Self {
        self.default_sort.push(sort);
        self
    }

    /// Restricts the resource to listing.
    #[must_use]
    pub fn list_only(mut self) -> Self {
        self.exposure = ResourceExposure::ListOnly;
        self
    }

    /// Returns the resource type identifier.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns declared associations.
    #[must_use]
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Finds an association by name.
    #[must_use]
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|association| association.name() == name)
    }

    /// Returns declared filters in order.
    #[must_use]
    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    /// Returns searchable fields.
    #[must_use]
    pub fn searchable_fields(&self) -> &SearchableFieldSet {
        &self.searchable_fields
    }

    /// Returns the default ordering.
    #[must_use]
    pub fn default_sort(&self) -> &[ResourceSort] {
        &self.default_sort
    }

    /// Returns the exposed operations.
    #[must_use]
    pub fn exposure(&self) -> ResourceExposure {
        self.exposure
    }

    /// Checks filter and association declarations for internal consistency.
    pub fn validate(&self) -> AppResult<()> {
        let mut filter_names = BTreeSet::new();
        for filter in &self.filters {
            if !filter_names.insert(filter.name()) {
                return Err(AppError::Configuration(format!(
                    "resource '{}' declares filter '{}' more than once",
                    self.resource_type(),
                    filter.name()
                )));
            }

            if let FilterTarget::Association { association, .. } = filter.target()? {
                if self.association(association).is_none() {
                    return Err(AppError::Configuration(format!(
                        "resource '{}' filter '{}' references unknown association '{}'",
                        self.resource_type(),
                        filter.name(),
                        association
                    )));
                }
            }
        }

        let mut association_names = BTreeSet::new();
        for association in &self.associations {
            if !association_names.insert(association.name()) {
                return Err(AppError::Configuration(format!(
                    "resource '{}' declares association '{}' more than once",
                    self.resource_type(),
                    association.name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use quire_core::AppError;
    use serde_json::{Value, json};

    use super::{
        Association, FilterModifier, FilterSpec, FilterTarget, ResourceDefinition,
        SearchableFieldSet,
    };

    fn order_definition() -> ResourceDefinition {
        ResourceDefinition::new("order", "Order")
            .unwrap_or_else(|_| unreachable!())
            .with_association(
                Association::new("customer", "customer", "customer_id")
                    .unwrap_or_else(|_| unreachable!()),
            )
    }

    #[test]
    fn filter_field_defaults_to_name() {
        let filter = FilterSpec::new("status").unwrap_or_else(|_| unreachable!());
        assert_eq!(filter.field(), "status");
        assert_eq!(filter.modifier(), FilterModifier::Text);
        assert!(matches!(filter.target(), Ok(FilterTarget::Field("status"))));
    }

    #[test]
    fn dotted_field_targets_association() {
        let filter = FilterSpec::new("customer")
            .and_then(|filter| filter.with_field("customer.email"))
            .unwrap_or_else(|_| unreachable!());

        assert!(matches!(
            filter.target(),
            Ok(FilterTarget::Association {
                association: "customer",
                target_field: "email"
            })
        ));
    }

    #[test]
    fn multi_hop_field_is_configuration_error() {
        let filter = FilterSpec::new("region")
            .and_then(|filter| filter.with_field("customer.address.region"))
            .unwrap_or_else(|_| unreachable!());

        assert!(matches!(filter.target(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn modifiers_convert_and_name_parameter_on_failure() {
        assert_eq!(
            FilterModifier::Integer.convert("total", " 12 ").ok(),
            Some(json!(12))
        );
        assert_eq!(
            FilterModifier::Boolean.convert("paid", "Yes").ok(),
            Some(Value::Bool(true))
        );
        assert_eq!(
            FilterModifier::Text.convert("status", " open ").ok(),
            Some(json!(" open "))
        );

        let error = FilterModifier::Float.convert("amount", "abc");
        assert!(matches!(
            error,
            Err(AppError::InvalidParameter { ref parameter, .. }) if parameter == "amount"
        ));
    }

    #[test]
    fn validate_rejects_unknown_association() {
        let definition = order_definition().with_filter(
            FilterSpec::new("vendor")
                .and_then(|filter| filter.with_field("vendor.name"))
                .unwrap_or_else(|_| unreachable!()),
        );

        assert!(matches!(
            definition.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn validate_accepts_declared_association() {
        let definition = order_definition().with_filter(
            FilterSpec::new("customer")
                .and_then(|filter| filter.with_field("customer.email"))
                .unwrap_or_else(|_| unreachable!()),
        );

        assert!(definition.validate().is_ok());
    }

    #[test]
    fn searchable_fields_keep_first_occurrence_order() {
        let fields = SearchableFieldSet::new(["name", "email", "name"])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    proptest! {
        #[test]
        fn integer_modifier_accepts_padded_integers(value in any::<i64>(), padding in 0usize..3) {
            let raw = format!("{}{value}{}", " ".repeat(padding), " ".repeat(padding));
            prop_assert_eq!(
                FilterModifier::Integer.convert("quantity", &raw).ok(),
                Some(Value::from(value))
            );
        }

        #[test]
        fn text_modifier_keeps_raw_value(raw in ".*") {
            prop_assert_eq!(
                FilterModifier::Text.convert("status", &raw).ok(),
                Some(Value::String(raw.clone()))
            );
        }
    }
}
