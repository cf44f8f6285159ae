use std::sync::LazyLock;

use regex::Regex;

use switchyard_api::config::{ConfigParam, ConfigValues, Options};
use switchyard_api::error::PluginError;
use switchyard_api::record::Record;
use switchyard_api::requirements::require_map;
use switchyard_api::transform::{Configurable, Predicate};
use switchyard_api::value::Value;
use switchyard_api::ConfigParams;

const PURPOSE: &str = "checking a field for an IP address";

/// Four dot-separated octets, each 0-255, anchored on both ends. ASCII digits only.
static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])(?:\.(?:[01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])){3}$",
    )
    .unwrap()
});

#[derive(Debug, Default, ConfigParams)]
pub struct FieldIsIpConfig {
    #[param(
        importance = "high",
        required,
        non_empty,
        description = "The field name to look for an IP address."
    )]
    pub field: String,

    #[param(
        rename = "useValue",
        importance = "low",
        description = "Use the record value instead of the key to look for an IP address."
    )]
    pub use_value: bool,
}

/// True for records whose configured field holds an IPv4 dotted-quad.
///
/// Only schemaless (map) payloads are inspected. A missing or null field
/// renders as `"null"` and therefore classifies as `false`.
#[derive(Debug, Clone)]
pub struct FieldIsIp {
    field: String,
    use_value: bool,
}

impl FieldIsIp {
    pub fn new(config: FieldIsIpConfig) -> Self {
        Self {
            field: config.field,
            use_value: config.use_value,
        }
    }

    fn field_text(&self, record: &Record) -> Result<String, PluginError> {
        let payload = if self.use_value { record.value() } else { record.key() };
        let map = require_map(payload, PURPOSE)?;
        Ok(Value::lookup(map, &self.field).to_string())
    }
}

/// Whether `candidate` is a dotted-quad IPv4 address, ignoring surrounding
/// double quotes left over from pre-serialized values.
pub fn is_ipv4(candidate: &str) -> bool {
    DOTTED_QUAD.is_match(candidate.trim_matches('"'))
}

impl Predicate for FieldIsIp {
    fn test(&self, record: &Record) -> bool {
        match self.field_text(record) {
            Ok(text) => is_ipv4(&text),
            Err(e) => {
                tracing::trace!(field = %self.field, error = %e, "cannot classify record");
                false
            }
        }
    }
}

impl Configurable for FieldIsIp {
    fn describe_config() -> Vec<ConfigParam> {
        FieldIsIpConfig::config_params()
    }

    fn configure(options: &Options) -> Result<Self, PluginError> {
        let values = ConfigValues::from_options(options, &Self::describe_config())?;
        let config = FieldIsIpConfig::from_config(&values)?;
        tracing::debug!(field = %config.field, use_value = config.use_value, "configured field-is-ip");
        Ok(Self::new(config))
    }
}
