use regex::Regex;

use switchyard_api::config::{ConfigParam, ConfigValues, Options};
use switchyard_api::error::PluginError;
use switchyard_api::record::{Data, Overrides, Record};
use switchyard_api::requirements::{require_map, require_struct};
use switchyard_api::transform::{Configurable, Transformation};
use switchyard_api::value::Value;
use switchyard_api::ConfigParams;

const PURPOSE: &str = "routing based on a pattern match";

#[derive(Debug, Default, ConfigParams)]
pub struct RegexRouterConfig {
    #[param(
        rename = "fieldName",
        importance = "high",
        required,
        non_empty,
        description = "Field name in the record value to match against the pattern."
    )]
    pub field_name: String,

    #[param(
        importance = "high",
        required,
        description = "Regular expression searched for anywhere in the field's string form."
    )]
    pub pattern: String,

    #[param(
        rename = "targetDestination",
        importance = "high",
        required,
        non_empty,
        description = "Destination to route the record to when the pattern matches."
    )]
    pub target_destination: String,
}

/// Re-routes records whose value field contains a pattern match.
///
/// Schemaless: a missing or null field leaves the record as is.
/// With schema: a field the schema does not declare is a data-shape
/// error; a declared field holding null leaves the record as is.
#[derive(Debug, Clone)]
pub struct RegexRouter {
    field_name: String,
    pattern: Regex,
    target_destination: String,
}

impl RegexRouter {
    /// Compiles the pattern once; an invalid pattern is a config error.
    pub fn new(config: RegexRouterConfig) -> Result<Self, PluginError> {
        let pattern = Regex::new(&config.pattern)
            .map_err(|e| PluginError::config(format!("parameter 'pattern': {e}")))?;
        Ok(Self {
            field_name: config.field_name,
            pattern,
            target_destination: config.target_destination,
        })
    }

    fn apply_schemaless(&self, record: &Record) -> Result<Record, PluginError> {
        let value = require_map(record.value(), PURPOSE)?;
        Ok(self.route(record, Value::lookup(value, &self.field_name)))
    }

    fn apply_with_schema(&self, record: &Record) -> Result<Record, PluginError> {
        let value = require_struct(record.value(), PURPOSE)?;
        let field = value.schema().field(&self.field_name).ok_or_else(|| {
            PluginError::data_shape(format!(
                "Field does not exist in the value: {}",
                self.field_name
            ))
        })?;
        Ok(self.route(record, value.get_field(field)))
    }

    fn route(&self, record: &Record, field_value: &Value) -> Record {
        if field_value.is_null() {
            return record.clone();
        }

        let text = field_value.to_string();
        if self.pattern.is_match(&text) {
            tracing::trace!(
                field = %self.field_name,
                from = record.destination(),
                to = %self.target_destination,
                "pattern matched, rerouting"
            );
            record.new_record(Overrides::new().destination(self.target_destination.as_str()))
        } else {
            record.clone()
        }
    }
}

impl Transformation for RegexRouter {
    fn apply(&self, record: &Record) -> Result<Record, PluginError> {
        match record.value() {
            Data::Dynamic(_) => self.apply_schemaless(record),
            Data::Structured(_) => self.apply_with_schema(record),
        }
    }
}

impl Configurable for RegexRouter {
    fn describe_config() -> Vec<ConfigParam> {
        RegexRouterConfig::config_params()
    }

    fn configure(options: &Options) -> Result<Self, PluginError> {
        let values = ConfigValues::from_options(options, &Self::describe_config())?;
        let config = RegexRouterConfig::from_config(&values)?;
        tracing::debug!(
            field_name = %config.field_name,
            pattern = %config.pattern,
            target = %config.target_destination,
            "configured regex-router"
        );
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use switchyard_api::error::ErrorKind;
    use switchyard_api::schema::{FieldType, ScalarType, Schema, SchemaRef};
    use switchyard_api::value::Struct;

    use super::*;

    fn router(field: &str, pattern: &str, target: &str) -> RegexRouter {
        let serde_json::Value::Object(options) = json!({
            "fieldName": field,
            "pattern": pattern,
            "targetDestination": target,
        }) else {
            unreachable!()
        };
        RegexRouter::configure(&options).unwrap()
    }

    fn env_schema() -> SchemaRef {
        Arc::new(
            Schema::builder()
                .field("environment", FieldType::optional(ScalarType::String))
                .field("message", FieldType::optional(ScalarType::String))
                .build()
                .unwrap(),
        )
    }

    fn schemaless(value: serde_json::Value) -> Record {
        Record::new("default-topic", serde_json::Value::Null, value).with_partition(0)
    }

    #[test]
    fn test_schemaless_match_routes() {
        let xform = router("environment", "prod.*", "production-topic");
        let record = schemaless(json!({"environment": "production", "message": "test"}));

        let out = xform.apply(&record).unwrap();

        assert_eq!(out.destination(), "production-topic");
        assert_eq!(out.value(), record.value());
        assert_eq!(out.key(), record.key());
        assert_eq!(out.partition(), Some(0));
    }

    #[test]
    fn test_schemaless_no_match_keeps_destination() {
        let xform = router("environment", "prod.*", "production-topic");
        let record = schemaless(json!({"environment": "development", "message": "test"}));
        assert_eq!(xform.apply(&record).unwrap(), record);
    }

    #[test]
    fn test_schemaless_missing_or_null_field_keeps_destination() {
        let xform = router("environment", "prod.*", "production-topic");
        let record = schemaless(json!({"message": "test"}));
        assert_eq!(xform.apply(&record).unwrap(), record);

        let record = schemaless(json!({"environment": null}));
        assert_eq!(xform.apply(&record).unwrap(), record);
    }

    #[test]
    fn test_substring_search_not_full_match() {
        let xform = router("environment", "prod", "production-topic");
        let record = schemaless(json!({"environment": "pre-production-eu"}));
        assert_eq!(xform.apply(&record).unwrap().destination(), "production-topic");

        let anchored = router("environment", "^prod$", "production-topic");
        assert_eq!(anchored.apply(&record).unwrap().destination(), "default-topic");
    }

    #[test]
    fn test_non_string_field_uses_string_form() {
        let xform = router("status", "^5[0-9]{2}$", "errors");
        let record = schemaless(json!({"status": 503}));
        assert_eq!(xform.apply(&record).unwrap().destination(), "errors");
    }

    #[test]
    fn test_schemaless_requires_map() {
        let xform = router("environment", "prod", "production-topic");
        let record = schemaless(json!("production"));
        assert_eq!(xform.apply(&record).unwrap_err().kind, ErrorKind::DataShape);
    }

    #[test]
    fn test_with_schema_match_routes() {
        let xform = router("environment", "prod.*", "production-topic");
        let value = Struct::new(env_schema())
            .with("environment", "production")
            .unwrap()
            .with("message", "test")
            .unwrap();
        let record = Record::new("default-topic", serde_json::Value::Null, value);

        let out = xform.apply(&record).unwrap();

        assert_eq!(out.destination(), "production-topic");
        assert!(Arc::ptr_eq(
            out.value_schema().unwrap(),
            record.value_schema().unwrap()
        ));
        assert_eq!(out.value(), record.value());
    }

    #[test]
    fn test_with_schema_no_match() {
        let xform = router("environment", "prod.*", "production-topic");
        let value = Struct::new(env_schema()).with("environment", "staging").unwrap();
        let record = Record::new("default-topic", serde_json::Value::Null, value);
        assert_eq!(xform.apply(&record).unwrap().destination(), "default-topic");
    }

    #[test]
    fn test_with_schema_missing_field_is_error() {
        let xform = router("region", "eu", "eu-topic");
        let record = Record::new(
            "default-topic",
            serde_json::Value::Null,
            Struct::new(env_schema()),
        );

        let err = xform.apply(&record).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataShape);
        assert_eq!(err.message, "Field does not exist in the value: region");
    }

    #[test]
    fn test_with_schema_null_field_keeps_destination() {
        let xform = router("environment", ".*", "anywhere");
        let record = Record::new(
            "default-topic",
            serde_json::Value::Null,
            Struct::new(env_schema()).with("message", "test").unwrap(),
        );
        assert_eq!(xform.apply(&record).unwrap(), record);
    }

    #[test]
    fn test_already_routed_record_is_unchanged() {
        let xform = router("environment", "prod", "production-topic");
        let record = Record::new(
            "production-topic",
            json!({"id": 7}),
            json!({"environment": "production"}),
        )
        .with_timestamp(1_700_000_000_000);

        assert_eq!(xform.apply(&record).unwrap(), record);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let serde_json::Value::Object(options) = json!({
            "fieldName": "environment",
            "pattern": "prod(",
            "targetDestination": "t",
        }) else {
            unreachable!()
        };
        let err = RegexRouter::configure(&options).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.starts_with("parameter 'pattern'"));
    }

    #[test]
    fn test_describe_config() {
        let names: Vec<String> = RegexRouter::describe_config()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["fieldName", "pattern", "targetDestination"]);
    }
}
