use quire_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved field name resolving to a record's own identifier.
pub const RECORD_ID_FIELD: &str = "id";

/// Persisted entity of one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    record_id: NonEmptyString,
    resource_type: NonEmptyString,
    data: Value,
}

impl Record {
    /// Creates a validated record projection.
    pub fn new(
        record_id: impl Into<String>,
        resource_type: impl Into<String>,
        data: Value,
    ) -> AppResult<Self> {
        if !data.is_object() {
            return Err(AppError::Validation(
                "record data must be a JSON object".to_owned(),
            ));
        }

        Ok(Self {
            record_id: NonEmptyString::new(record_id)?,
            resource_type: NonEmptyString::new(resource_type)?,
            data,
        })
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub fn record_id(&self) -> &NonEmptyString {
        &self.record_id
    }

    /// Returns the resource type this record belongs to.
    #[must_use]
    pub fn resource_type(&self) -> &NonEmptyString {
        &self.resource_type
    }

    /// Returns the record JSON object.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the record fields as a JSON map.
    #[must_use]
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.data.as_object()
    }

    /// Returns one field value. `id` resolves to the record identifier.
    #[must_use]
    pub fn field(&self, field_name: &str) -> Option<Value> {
        if field_name == RECORD_ID_FIELD {
            return Some(Value::String(self.record_id.as_str().to_owned()));
        }

        self.fields()
            .and_then(|fields| fields.get(field_name))
            .cloned()
    }

    /// Consumes the record and returns its JSON object.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::Record;

    #[test]
    fn record_requires_object_data() {
        let result = Record::new("1", "order", json!(["not", "an", "object"]));
        assert!(result.is_err());
    }

    #[test]
    fn record_requires_identifier() {
        let result = Record::new(" ", "order", json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn id_field_resolves_to_record_identifier() {
        let record = Record::new("42", "order", json!({"id": "shadowed", "total": 10}))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(record.field("id"), Some(Value::String("42".to_owned())));
        assert_eq!(record.field("total"), Some(json!(10)));
        assert_eq!(record.field("missing"), None);
    }
}
