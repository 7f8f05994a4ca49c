use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Presence of one field in a partial-update body.
#[derive(Debug, PartialEq)]
pub enum NullableValue<T> {
    Omitted,
    Null,
    Value(T),
}

impl<T> NullableValue<T> {
    /// For non-nullable columns: omitted stays `None`, explicit null is rejected.
    pub fn required(self, field: &str) -> Result<Option<T>, String> {
        match self {
            NullableValue::Omitted => Ok(None),
            NullableValue::Null => Err(format!("{field} cannot be null")),
            NullableValue::Value(value) => Ok(Some(value)),
        }
    }

    /// For nullable columns: `Some(None)` clears the column.
    pub fn nullable(self) -> Option<Option<T>> {
        match self {
            NullableValue::Omitted => None,
            NullableValue::Null => Some(None),
            NullableValue::Value(value) => Some(Some(value)),
        }
    }
}

pub fn object_body(body: &Value) -> Result<&Map<String, Value>, String> {
    body.as_object()
        .ok_or_else(|| format!("expected a JSON object, got {body}"))
}

pub fn classify_field<T: DeserializeOwned>(
    body: &Map<String, Value>,
    field: &str,
) -> Result<NullableValue<T>, String> {
    match body.get(field) {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(other) => serde_json::from_value(other.clone())
            .map(NullableValue::Value)
            .map_err(|err| format!("invalid value for {field}: {err}")),
    }
}
