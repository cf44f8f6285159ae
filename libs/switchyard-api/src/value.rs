use std::collections::BTreeMap;
use std::fmt;

use crate::error::PluginError;
use crate::schema::{Field, SchemaRef};

/// Dynamic Mapping Value: untyped, string-keyed, no attached schema.
///
/// Ordered so that rendering and comparisons are deterministic.
pub type Mapping = BTreeMap<String, Value>;

/// Canonical untyped value.
///
/// A missing mapping entry and an explicit `Null` are read the same way
/// by every unit (see `Value::lookup`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Opaque binary data.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(Mapping),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the variant, used in data-shape error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Look up `field` in a mapping. Absent keys read as `Null`.
    pub fn lookup<'a>(map: &'a Mapping, field: &str) -> &'a Value {
        map.get(field).unwrap_or(&NULL)
    }

    /// Convert into a `serde_json::Value`. Bytes become an array of numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|x| (*x).into()).collect()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// String form used by predicates and routers.
///
/// Null renders as `null`, strings render without quotes, mappings as `{k=v, ...}`.
/// Floats use Rust's shortest form, so `1.0` renders as `1`; router patterns
/// on float fields see that form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// JSON integers outside the `i64` range become `Float` and may lose precision.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Mapping> for Value {
    fn from(v: Mapping) -> Self {
        Value::Map(v)
    }
}

// ════════════════════════════════════════════════════════════════
//  Struct
// ════════════════════════════════════════════════════════════════

/// Structured Value: one value per field of exactly one schema.
///
/// Positional: `values[i]` belongs to `schema.fields()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl Struct {
    /// New struct with every field set to null.
    pub fn new(schema: SchemaRef) -> Self {
        let values = vec![Value::Null; schema.fields().len()];
        Self { schema, values }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn lookup_field(&self, name: &str) -> Result<&Field, PluginError> {
        self.schema
            .field(name)
            .ok_or_else(|| PluginError::schema(format!("{name} is not a valid field name")))
    }

    pub fn get(&self, name: &str) -> Result<&Value, PluginError> {
        let field = self.lookup_field(name)?;
        Ok(&self.values[field.index()])
    }

    /// Value of a field taken from this struct's own schema.
    pub fn get_field(&self, field: &Field) -> &Value {
        self.values.get(field.index()).unwrap_or(&NULL)
    }

    /// Set a field, checking the value against the declared type.
    pub fn put(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self, PluginError> {
        let value = value.into();
        let field = self.lookup_field(name)?;
        if !field.field_type().accepts(&value) {
            return Err(PluginError::schema(format!(
                "invalid {} value for field '{name}' of type {}",
                value.type_name(),
                field.field_type()
            )));
        }
        let index = field.index();
        self.values[index] = value;
        Ok(self)
    }

    /// Owned variant of `put` for builder-style construction.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, PluginError> {
        self.put(name, value)?;
        Ok(self)
    }

    /// Check that every required field holds a value.
    pub fn validate(&self) -> Result<(), PluginError> {
        for field in self.schema.fields() {
            if !field.field_type().optional && self.values[field.index()].is_null() {
                return Err(PluginError::schema(format!(
                    "invalid value: null used for required field '{}'",
                    field.name()
                )));
            }
        }
        Ok(())
    }

    /// `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.schema.fields().iter().zip(self.values.iter())
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Struct{{")?;
        let mut first = true;
        for (field, value) in self.iter().filter(|(_, v)| !v.is_null()) {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}={value}", field.name())?;
        }
        write!(f, "}}")
    }
}
