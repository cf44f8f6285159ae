use std::collections::BTreeMap;
use std::sync::Arc;

use switchyard_api::config::{ConfigParam, Options};
use switchyard_api::error::PluginError;
use switchyard_api::transform::{Configurable, Predicate, Transformation};

use crate::error::EngineError;

/// Whether a registered kind builds a predicate or a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Predicate,
    Transform,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Predicate => write!(f, "predicate"),
            UnitKind::Transform => write!(f, "transform"),
        }
    }
}

type DescribeFn = fn() -> Vec<ConfigParam>;
type CreateTransformFn = fn(&Options) -> Result<Arc<dyn Transformation>, PluginError>;
type CreatePredicateFn = fn(&Options) -> Result<Arc<dyn Predicate>, PluginError>;

enum Factory {
    Transform(CreateTransformFn),
    Predicate(CreatePredicateFn),
}

struct Entry {
    describe: DescribeFn,
    factory: Factory,
}

fn create_transform<T>(options: &Options) -> Result<Arc<dyn Transformation>, PluginError>
where
    T: Transformation + Configurable + 'static,
{
    Ok(Arc::new(T::configure(options)?))
}

fn create_predicate<P>(options: &Options) -> Result<Arc<dyn Predicate>, PluginError>
where
    P: Predicate + Configurable + 'static,
{
    Ok(Arc::new(P::configure(options)?))
}

/// Unit kinds the engine can instantiate by name.
pub struct Registry {
    entries: BTreeMap<&'static str, Entry>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registry with every unit shipped in this workspace.
    pub fn builtin() -> Self {
        use switchyard_predicate_field_is_ip::FieldIsIp;
        use switchyard_transform_insert_timestamp::{InsertTimestampKey, InsertTimestampValue};
        use switchyard_transform_key_to_value::KeyToValue;
        use switchyard_transform_regex_router::RegexRouter;

        let mut registry = Self::new();
        registry.register_predicate::<FieldIsIp>("field-is-ip");
        registry.register_transform::<KeyToValue>("key-to-value");
        registry.register_transform::<RegexRouter>("regex-router");
        registry.register_transform::<InsertTimestampValue>("insert-timestamp-value");
        registry.register_transform::<InsertTimestampKey>("insert-timestamp-key");
        registry
    }

    pub fn register_transform<T>(&mut self, kind: &'static str)
    where
        T: Transformation + Configurable + 'static,
    {
        self.entries.insert(
            kind,
            Entry {
                describe: T::describe_config,
                factory: Factory::Transform(create_transform::<T>),
            },
        );
    }

    pub fn register_predicate<P>(&mut self, kind: &'static str)
    where
        P: Predicate + Configurable + 'static,
    {
        self.entries.insert(
            kind,
            Entry {
                describe: P::describe_config,
                factory: Factory::Predicate(create_predicate::<P>),
            },
        );
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<(&'static str, UnitKind)> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let kind = match entry.factory {
                    Factory::Transform(_) => UnitKind::Transform,
                    Factory::Predicate(_) => UnitKind::Predicate,
                };
                (*name, kind)
            })
            .collect()
    }

    /// Declared options of a unit kind.
    pub fn describe(&self, kind: &str) -> Result<Vec<ConfigParam>, EngineError> {
        self.entries
            .get(kind)
            .map(|entry| (entry.describe)())
            .ok_or_else(|| EngineError::UnknownUnit(kind.to_string()))
    }

    pub fn create_transform(
        &self,
        kind: &str,
        config: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn Transformation>, EngineError> {
        match self.entries.get(kind).map(|e| &e.factory) {
            Some(Factory::Transform(create)) => Ok(create(&options_from(config)?)?),
            Some(Factory::Predicate(_)) => Err(EngineError::Config(format!(
                "'{kind}' is a predicate, not a transform"
            ))),
            None => Err(EngineError::UnknownUnit(kind.to_string())),
        }
    }

    pub fn create_predicate(
        &self,
        kind: &str,
        config: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn Predicate>, EngineError> {
        match self.entries.get(kind).map(|e| &e.factory) {
            Some(Factory::Predicate(create)) => Ok(create(&options_from(config)?)?),
            Some(Factory::Transform(_)) => Err(EngineError::Config(format!(
                "'{kind}' is a transform, not a predicate"
            ))),
            None => Err(EngineError::UnknownUnit(kind.to_string())),
        }
    }
}

/// Unit config must be a table/object; absent config means no options.
fn options_from(config: Option<&serde_json::Value>) -> Result<Options, EngineError> {
    match config {
        Some(serde_json::Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(EngineError::Config(
            "unit config must be a table/object".into(),
        )),
        None => Ok(Options::new()),
    }
}
