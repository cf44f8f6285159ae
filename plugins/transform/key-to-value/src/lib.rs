use std::sync::Arc;

use switchyard_api::cache::{self, SchemaCache, DEFAULT_SCHEMA_CACHE_SIZE};
use switchyard_api::config::{ConfigParam, ConfigValues, Options};
use switchyard_api::error::PluginError;
use switchyard_api::record::{Data, Overrides, Record};
use switchyard_api::requirements::{require_map, require_struct};
use switchyard_api::transform::{Configurable, Transformation};
use switchyard_api::value::{Struct, Value};
use switchyard_api::ConfigParams;

const PURPOSE: &str = "copying a field from the key to the record value";

#[derive(Debug, ConfigParams)]
pub struct KeyToValueConfig {
    #[param(
        rename = "keyField",
        importance = "high",
        required,
        non_empty,
        description = "Field name in the record key to copy into the record value."
    )]
    pub key_field: String,

    #[param(
        rename = "msgField",
        importance = "high",
        required,
        non_empty,
        description = "Field name in the record value to copy the key field into."
    )]
    pub msg_field: String,

    #[param(
        rename = "dropKey",
        importance = "low",
        description = "If set to true, the key (and key schema) is cleared after the copy."
    )]
    pub drop_key: bool,

    #[param(
        rename = "schemaCacheSize",
        importance = "low",
        description = "Maximum number of derived value schemas kept by this transform."
    )]
    pub schema_cache_size: u64,
}

impl Default for KeyToValueConfig {
    fn default() -> Self {
        Self {
            key_field: String::new(),
            msg_field: String::new(),
            drop_key: false,
            schema_cache_size: DEFAULT_SCHEMA_CACHE_SIZE,
        }
    }
}

/// Copies `keyField` from the record key into `msgField` of the record value.
///
/// With schemas, a value schema lacking `msgField` is extended with a field
/// of the key field's type. Extended schemas are cached per source schema,
/// so equal inputs always map to the same output schema instance.
#[derive(Debug)]
pub struct KeyToValue {
    key_field: String,
    msg_field: String,
    drop_key: bool,
    schema_cache: SchemaCache,
}

impl KeyToValue {
    pub fn new(config: KeyToValueConfig) -> Self {
        Self {
            key_field: config.key_field,
            msg_field: config.msg_field,
            drop_key: config.drop_key,
            schema_cache: SchemaCache::new(config.schema_cache_size),
        }
    }

    fn apply_schemaless(&self, record: &Record) -> Result<Record, PluginError> {
        let value = require_map(record.value(), PURPOSE)?;
        let key = require_map(record.key(), PURPOSE)?;

        let mut updated = value.clone();
        updated.insert(
            self.msg_field.clone(),
            Value::lookup(key, &self.key_field).clone(),
        );

        Ok(self.finish(record, Data::from(updated)))
    }

    fn apply_with_schema(&self, record: &Record) -> Result<Record, PluginError> {
        let value = require_struct(record.value(), PURPOSE)?;
        let key = require_struct(record.key(), PURPOSE)?;

        let key_field = key.schema().field(&self.key_field).ok_or_else(|| {
            PluginError::data_shape(format!(
                "Field does not exist in the key: {}",
                self.key_field
            ))
        })?;

        // A new value field changes the value schema; registries downstream
        // must accept the extended schema as compatible.
        let value_schema = match value.schema().field(&self.msg_field) {
            Some(_) => Arc::clone(value.schema()),
            None => self
                .schema_cache
                .get_or_derive(value.schema(), &self.msg_field, || {
                    value
                        .schema()
                        .with_field(&self.msg_field, key_field.field_type())
                })?,
        };

        let mut updated = Struct::new(value_schema);
        for (field, v) in value.iter() {
            updated.put(field.name(), v.clone())?;
        }
        updated
            .put(&self.msg_field, key.get_field(key_field).clone())
            .map_err(|e| PluginError::data_shape(e.message).with_context(PURPOSE))?;

        Ok(self.finish(record, Data::from(updated)))
    }

    fn finish(&self, record: &Record, value: Data) -> Record {
        let overrides = Overrides::new().value(value);
        if self.drop_key {
            record.new_record(overrides.drop_key())
        } else {
            record.new_record(overrides)
        }
    }
}

impl Transformation for KeyToValue {
    fn apply(&self, record: &Record) -> Result<Record, PluginError> {
        match record.value() {
            Data::Dynamic(_) => self.apply_schemaless(record),
            Data::Structured(_) => self.apply_with_schema(record),
        }
    }
}

impl Configurable for KeyToValue {
    fn describe_config() -> Vec<ConfigParam> {
        KeyToValueConfig::config_params()
    }

    fn configure(options: &Options) -> Result<Self, PluginError> {
        let values = ConfigValues::from_options(options, &Self::describe_config())?;
        let config = KeyToValueConfig::from_config(&values)?;
        cache::check_capacity(config.schema_cache_size)?;
        tracing::debug!(
            key_field = %config.key_field,
            msg_field = %config.msg_field,
            drop_key = config.drop_key,
            "configured key-to-value"
        );
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchyard_api::error::ErrorKind;
    use switchyard_api::schema::{FieldType, ScalarType, Schema, SchemaRef};

    use super::*;

    fn transform(options: serde_json::Value) -> KeyToValue {
        let serde_json::Value::Object(options) = options else {
            panic!("options must be an object");
        };
        KeyToValue::configure(&options).unwrap()
    }

    fn int32_schema(fields: &[&str]) -> SchemaRef {
        let builder = fields.iter().fold(Schema::builder(), |b, name| {
            b.field(*name, FieldType::required(ScalarType::Int32))
        });
        Arc::new(builder.build().unwrap())
    }

    fn key_struct() -> Struct {
        Struct::new(int32_schema(&["a", "k"]))
            .with("a", 1)
            .unwrap()
            .with("k", 2)
            .unwrap()
    }

    #[test]
    fn test_schemaless() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let record = Record::new("topic", json!({"a": 1, "k": 2}), json!({"a": 1})).with_partition(0);

        let out = xform.apply(&record).unwrap();

        assert_eq!(out.value(), &Data::from(json!({"a": 1, "v": 2})));
        assert_eq!(out.key(), record.key());
        assert_eq!(out.destination(), "topic");
        assert_eq!(out.partition(), Some(0));
        // input untouched
        assert_eq!(record.value(), &Data::from(json!({"a": 1})));
    }

    #[test]
    fn test_schemaless_missing_key_field_copies_null() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let record = Record::new("topic", json!({"a": 1}), json!({"v": 9}));
        let out = xform.apply(&record).unwrap();
        assert_eq!(out.value(), &Data::from(json!({"v": null})));
    }

    #[test]
    fn test_schemaless_requires_maps() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let record = Record::new("topic", json!("plain-key"), json!({"a": 1}));
        let err = xform.apply(&record).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataShape);

        let record = Record::new("topic", json!({"k": 1}), json!([1, 2]));
        assert!(xform.apply(&record).unwrap_err().is_data_shape());
    }

    #[test]
    fn test_drop_key_schemaless() {
        let xform = transform(json!({"keyField": "k", "msgField": "v", "dropKey": "true"}));
        let record = Record::new("topic", json!({"a": 1, "k": 2}), json!({"a": 1}));
        let out = xform.apply(&record).unwrap();
        assert_eq!(out.value(), &Data::from(json!({"a": 1, "v": 2})));
        assert!(out.key().is_null());
    }

    #[test]
    fn test_with_schema_existing_field() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let value_schema = int32_schema(&["a", "v"]);
        let value = Struct::new(Arc::clone(&value_schema)).with("a", 1).unwrap();
        let record = Record::new("topic", key_struct(), value);

        let out = xform.apply(&record).unwrap();

        let expected = Struct::new(int32_schema(&["a", "v"]))
            .with("a", 1)
            .unwrap()
            .with("v", 2)
            .unwrap();
        assert_eq!(out.key(), &Data::from(key_struct()));
        assert_eq!(out.value(), &Data::from(expected));
        // value schema already had the field: reused as-is
        assert!(Arc::ptr_eq(out.value_schema().unwrap(), &value_schema));
    }

    #[test]
    fn test_with_schema_derives_new_field() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let value_schema = Arc::new(
            Schema::builder()
                .name("name")
                .version(1)
                .doc("doc")
                .field("a", FieldType::optional(ScalarType::String))
                .build()
                .unwrap(),
        );
        let key_schema = Arc::new(
            Schema::builder()
                .field("k", FieldType::optional(ScalarType::Int64))
                .build()
                .unwrap(),
        );
        let key = Struct::new(key_schema).with("k", 42i64).unwrap();
        let value = Struct::new(value_schema).with("a", "x").unwrap();
        let record = Record::new("topic", key, value);

        let out = xform.apply(&record).unwrap();
        let schema = out.value_schema().unwrap();
        assert_eq!(schema.name(), Some("name"));
        assert_eq!(schema.version(), Some(1));
        assert_eq!(schema.doc(), Some("doc"));
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "v"]);
        assert_eq!(
            schema.field("v").unwrap().field_type(),
            FieldType::optional(ScalarType::Int64)
        );

        let Data::Structured(value) = out.value() else {
            panic!("expected structured value");
        };
        assert_eq!(value.get("a").unwrap(), &Value::from("x"));
        assert_eq!(value.get("v").unwrap(), &Value::Int(42));
    }

    #[test]
    fn test_derived_schema_is_stable_across_calls() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let make = |a: i32| {
            // a fresh but structurally identical schema each call
            let value = Struct::new(int32_schema(&["a"])).with("a", a).unwrap();
            Record::new("topic", key_struct(), value)
        };

        let first = xform.apply(&make(1)).unwrap();
        let second = xform.apply(&make(2)).unwrap();

        assert!(Arc::ptr_eq(
            first.value_schema().unwrap(),
            second.value_schema().unwrap()
        ));
    }

    #[test]
    fn test_schema_cache_size_must_be_positive() {
        let serde_json::Value::Object(options) =
            json!({"keyField": "k", "msgField": "v", "schemaCacheSize": 0})
        else {
            unreachable!()
        };
        let err = KeyToValue::configure(&options).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.message, "parameter 'schemaCacheSize': must be at least 1");

        let xform = transform(json!({"keyField": "k", "msgField": "v", "schemaCacheSize": 1}));
        let make = || {
            let value = Struct::new(int32_schema(&["a"])).with("a", 1).unwrap();
            Record::new("topic", key_struct(), value)
        };
        let first = xform.apply(&make()).unwrap();
        let second = xform.apply(&make()).unwrap();
        assert!(Arc::ptr_eq(
            first.value_schema().unwrap(),
            second.value_schema().unwrap()
        ));
    }

    #[test]
    fn test_non_existing_key_field() {
        let xform = transform(json!({"keyField": "no-exist", "msgField": "test"}));
        let key = Struct::new(int32_schema(&["k"])).with("k", 0).unwrap();
        let value = Struct::new(int32_schema(&["v"])).with("v", 1).unwrap();
        let record = Record::new("topic", key, value);

        let err = xform.apply(&record).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataShape);
        assert_eq!(err.message, "Field does not exist in the key: no-exist");
    }

    #[test]
    fn test_missing_key_schema() {
        let xform = transform(json!({"keyField": "test", "msgField": "test"}));
        let value = Struct::new(int32_schema(&["k"]));
        let record = Record::new("topic", serde_json::Value::Null, value);

        assert!(xform.apply(&record).unwrap_err().is_data_shape());
    }

    #[test]
    fn test_drop_key_with_schema() {
        let xform = transform(json!({"keyField": "k", "msgField": "v", "dropKey": true}));
        let value = Struct::new(int32_schema(&["a", "v"])).with("a", 1).unwrap();
        let record = Record::new("topic", key_struct(), value);

        let out = xform.apply(&record).unwrap();

        let expected = Struct::new(int32_schema(&["a", "v"]))
            .with("a", 1)
            .unwrap()
            .with("v", 2)
            .unwrap();
        assert_eq!(out.value(), &Data::from(expected));
        assert!(out.key().is_null());
        assert!(out.key_schema().is_none());
    }

    #[test]
    fn test_incompatible_existing_field_is_data_shape() {
        let xform = transform(json!({"keyField": "k", "msgField": "v"}));
        let value_schema = Arc::new(
            Schema::builder()
                .field("v", FieldType::optional(ScalarType::String))
                .build()
                .unwrap(),
        );
        let record = Record::new("topic", key_struct(), Struct::new(value_schema));
        assert!(xform.apply(&record).unwrap_err().is_data_shape());
    }

    #[test]
    fn test_configure_requires_fields() {
        let serde_json::Value::Object(options) = json!({"keyField": "k"}) else {
            unreachable!()
        };
        let err = KeyToValue::configure(&options).unwrap_err();
        assert_eq!(err.message, "missing required parameter 'msgField'");
    }
}
