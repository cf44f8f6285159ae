use std::marker::PhantomData;
use std::sync::Arc;

use switchyard_api::cache::{self, SchemaCache, DEFAULT_SCHEMA_CACHE_SIZE};
use switchyard_api::config::{ConfigParam, ConfigValues, Options};
use switchyard_api::error::PluginError;
use switchyard_api::record::{Data, Overrides, Record};
use switchyard_api::requirements::{require_map, require_struct};
use switchyard_api::schema::{FieldType, ScalarType};
use switchyard_api::transform::{Configurable, Transformation};
use switchyard_api::value::{Struct, Value};
use switchyard_api::{util, ConfigParams};

const PURPOSE: &str = "inserting a timestamp field";

/// Type of the inserted field when the schema has to be extended.
const TIMESTAMP_TYPE: FieldType = FieldType::required(ScalarType::Int64);

#[derive(Debug, ConfigParams)]
pub struct InsertTimestampConfig {
    #[param(
        rename = "tsFieldName",
        importance = "high",
        required,
        non_empty,
        description = "Field that receives the current time in epoch milliseconds."
    )]
    pub ts_field_name: String,

    #[param(
        rename = "schemaCacheSize",
        importance = "low",
        description = "Maximum number of derived schemas kept by this transform."
    )]
    pub schema_cache_size: u64,
}

impl Default for InsertTimestampConfig {
    fn default() -> Self {
        Self {
            ts_field_name: String::new(),
            schema_cache_size: DEFAULT_SCHEMA_CACHE_SIZE,
        }
    }
}

/// Which half of the record the timestamp goes into.
pub trait Target: Send + Sync + 'static {
    const NAME: &'static str;

    fn payload(record: &Record) -> &Data;

    fn replace(overrides: Overrides, data: Data) -> Overrides;
}

#[derive(Debug)]
pub struct KeySide;

#[derive(Debug)]
pub struct ValueSide;

impl Target for KeySide {
    const NAME: &'static str = "key";

    fn payload(record: &Record) -> &Data {
        record.key()
    }

    fn replace(overrides: Overrides, data: Data) -> Overrides {
        overrides.key(data)
    }
}

impl Target for ValueSide {
    const NAME: &'static str = "value";

    fn payload(record: &Record) -> &Data {
        record.value()
    }

    fn replace(overrides: Overrides, data: Data) -> Overrides {
        overrides.value(data)
    }
}

/// Inserts the current time into the record key.
pub type InsertTimestampKey = InsertTimestamp<KeySide>;
/// Inserts the current time into the record value.
pub type InsertTimestampValue = InsertTimestamp<ValueSide>;

/// Writes the current wall-clock time (epoch ms) into `tsFieldName`.
///
/// Structured payloads get their schema extended with a required int64
/// field unless it already declares one; extended schemas are cached.
pub struct InsertTimestamp<T: Target> {
    field: String,
    schema_cache: SchemaCache,
    clock: fn() -> i64,
    _target: PhantomData<T>,
}

impl<T: Target> std::fmt::Debug for InsertTimestamp<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertTimestamp")
            .field("target", &T::NAME)
            .field("field", &self.field)
            .field("schema_cache", &self.schema_cache)
            .finish()
    }
}

impl<T: Target> InsertTimestamp<T> {
    pub fn new(config: InsertTimestampConfig) -> Self {
        Self {
            field: config.ts_field_name,
            schema_cache: SchemaCache::new(config.schema_cache_size),
            clock: util::now_ms,
            _target: PhantomData,
        }
    }

    /// Replace the wall clock, e.g. with a fixed instant.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    fn apply_schemaless(&self, record: &Record, now: i64) -> Result<Record, PluginError> {
        let map = require_map(T::payload(record), PURPOSE)?;
        let mut updated = map.clone();
        updated.insert(self.field.clone(), Value::Int(now));
        Ok(record.new_record(T::replace(Overrides::new(), Data::from(updated))))
    }

    fn apply_with_schema(&self, record: &Record, now: i64) -> Result<Record, PluginError> {
        let current = require_struct(T::payload(record), PURPOSE)?;

        let schema = match current.schema().field(&self.field) {
            Some(_) => Arc::clone(current.schema()),
            None => self
                .schema_cache
                .get_or_derive(current.schema(), &self.field, || {
                    current.schema().with_field(&self.field, TIMESTAMP_TYPE)
                })?,
        };

        let mut updated = Struct::new(schema);
        for (field, v) in current.iter() {
            updated.put(field.name(), v.clone())?;
        }
        updated
            .put(&self.field, now)
            .map_err(|e| PluginError::data_shape(e.message).with_context(PURPOSE))?;

        Ok(record.new_record(T::replace(Overrides::new(), Data::from(updated))))
    }
}

impl<T: Target> Transformation for InsertTimestamp<T> {
    fn apply(&self, record: &Record) -> Result<Record, PluginError> {
        let now = (self.clock)();
        match T::payload(record) {
            Data::Dynamic(_) => self.apply_schemaless(record, now),
            Data::Structured(_) => self.apply_with_schema(record, now),
        }
    }
}

impl<T: Target> Configurable for InsertTimestamp<T> {
    fn describe_config() -> Vec<ConfigParam> {
        InsertTimestampConfig::config_params()
    }

    fn configure(options: &Options) -> Result<Self, PluginError> {
        let values = ConfigValues::from_options(options, &Self::describe_config())?;
        let config = InsertTimestampConfig::from_config(&values)?;
        cache::check_capacity(config.schema_cache_size)?;
        tracing::debug!(
            target_side = T::NAME,
            field = %config.ts_field_name,
            "configured insert-timestamp"
        );
        Ok(Self::new(config))
    }
}
