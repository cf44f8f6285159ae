use crate::schema::SchemaRef;
use crate::value::{Mapping, Struct, Value};

/// Key or value payload of a record.
///
/// The schema lives inside `Structured`, so "schema present iff payload
/// is structured" holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Schemaless payload. `Dynamic(Value::Null)` is an absent key/value.
    Dynamic(Value),
    /// Payload described by a schema.
    Structured(Struct),
}

impl Default for Data {
    fn default() -> Self {
        Data::Dynamic(Value::Null)
    }
}

impl Data {
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            Data::Structured(s) => Some(s.schema()),
            Data::Dynamic(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Dynamic(Value::Null))
    }

    /// Human-readable shape, used in data-shape error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Data::Dynamic(v) => v.type_name(),
            Data::Structured(_) => "struct",
        }
    }

    /// JSON form of the payload. Structs become plain objects; the schema
    /// itself is not carried.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Data::Dynamic(v) => v.to_json(),
            Data::Structured(s) => serde_json::Value::Object(
                s.iter()
                    .map(|(field, v)| (field.name().to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        Data::Dynamic(v)
    }
}

impl From<Mapping> for Data {
    fn from(m: Mapping) -> Self {
        Data::Dynamic(Value::Map(m))
    }
}

impl From<Struct> for Data {
    fn from(s: Struct) -> Self {
        Data::Structured(s)
    }
}

impl From<serde_json::Value> for Data {
    fn from(json: serde_json::Value) -> Self {
        Data::Dynamic(Value::from(json))
    }
}

/// One unit of pipeline data.
///
/// Immutable from a unit's point of view: transforms receive `&Record`
/// and build a new one through `new_record`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    destination: String,
    partition: Option<i32>,
    key: Data,
    value: Data,
    timestamp: Option<i64>,
}

impl Record {
    pub fn new(destination: impl Into<String>, key: impl Into<Data>, value: impl Into<Data>) -> Self {
        Self {
            destination: destination.into(),
            partition: None,
            key: key.into(),
            value: value.into(),
            timestamp: None,
        }
    }

    /// Construction-time setter; consumes the record being built.
    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Construction-time setter; consumes the record being built.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn partition(&self) -> Option<i32> {
        self.partition
    }

    pub fn key(&self) -> &Data {
        &self.key
    }

    pub fn key_schema(&self) -> Option<&SchemaRef> {
        self.key.schema()
    }

    pub fn value(&self) -> &Data {
        &self.value
    }

    pub fn value_schema(&self) -> Option<&SchemaRef> {
        self.value.schema()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Copy of this record with the fields set in `overrides` replaced.
    pub fn new_record(&self, overrides: Overrides) -> Record {
        Record {
            destination: overrides.destination.unwrap_or_else(|| self.destination.clone()),
            partition: overrides.partition.unwrap_or(self.partition),
            key: overrides.key.unwrap_or_else(|| self.key.clone()),
            value: overrides.value.unwrap_or_else(|| self.value.clone()),
            timestamp: overrides.timestamp.unwrap_or(self.timestamp),
        }
    }
}

/// Fields to replace in `Record::new_record`. Unset fields are carried over.
///
/// `partition` / `timestamp` take an `Option` so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    destination: Option<String>,
    partition: Option<Option<i32>>,
    key: Option<Data>,
    value: Option<Data>,
    timestamp: Option<Option<i64>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn partition(mut self, partition: Option<i32>) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn key(mut self, key: impl Into<Data>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Clear key and key schema.
    pub fn drop_key(self) -> Self {
        self.key(Data::default())
    }

    pub fn value(mut self, value: impl Into<Data>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_record_carries_unset_fields() {
        let record = Record::new("in", json!({"k": 1}), json!({"v": 2}))
            .with_partition(3)
            .with_timestamp(1_000);

        let routed = record.new_record(Overrides::new().destination("out"));
        assert_eq!(routed.destination(), "out");
        assert_eq!(routed.partition(), Some(3));
        assert_eq!(routed.timestamp(), Some(1_000));
        assert_eq!(routed.key(), record.key());
        assert_eq!(routed.value(), record.value());
        // input untouched
        assert_eq!(record.destination(), "in");
    }

    #[test]
    fn test_structured_payload_to_json() {
        use std::sync::Arc;

        use crate::schema::{FieldType, ScalarType, Schema};

        let schema = Schema::builder()
            .field("id", FieldType::required(ScalarType::Int32))
            .field("name", FieldType::optional(ScalarType::String))
            .build()
            .unwrap();
        let data = Data::from(Struct::new(Arc::new(schema)).with("id", 5).unwrap());

        assert_eq!(data.to_json(), json!({"id": 5, "name": null}));
        assert_eq!(Data::from(json!([1, "a"])).to_json(), json!([1, "a"]));
    }

    #[test]
    fn test_drop_key_clears_schema_too() {
        let record = Record::new("in", json!({"k": 1}), json!({}));
        let out = record.new_record(Overrides::new().drop_key().timestamp(None));
        assert!(out.key().is_null());
        assert!(out.key_schema().is_none());
        assert_eq!(out.timestamp(), None);
    }
}
