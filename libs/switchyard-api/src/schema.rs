use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::value::Value;

// ════════════════════════════════════════════════════════════════
//  Scalar Type
// ════════════════════════════════════════════════════════════════

/// Field value types a structured payload can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int8 => write!(f, "int8"),
            ScalarType::Int16 => write!(f, "int16"),
            ScalarType::Int32 => write!(f, "int32"),
            ScalarType::Int64 => write!(f, "int64"),
            ScalarType::Float32 => write!(f, "float32"),
            ScalarType::Float64 => write!(f, "float64"),
            ScalarType::String => write!(f, "string"),
            ScalarType::Bytes => write!(f, "bytes"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Type
// ════════════════════════════════════════════════════════════════

/// Declared type of a single field: scalar plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    pub scalar: ScalarType,
    #[serde(default)]
    pub optional: bool,
}

impl FieldType {
    pub const fn required(scalar: ScalarType) -> Self {
        Self { scalar, optional: false }
    }

    pub const fn optional(scalar: ScalarType) -> Self {
        Self { scalar, optional: true }
    }

    /// Whether `value` may be stored in a field of this type.
    ///
    /// Null is always accepted here; required-ness is checked by `Struct::validate`.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.scalar, value) {
            (_, Value::Null) => true,
            (ScalarType::Bool, Value::Bool(_)) => true,
            (ScalarType::Int8, Value::Int(v)) => i8::try_from(*v).is_ok(),
            (ScalarType::Int16, Value::Int(v)) => i16::try_from(*v).is_ok(),
            (ScalarType::Int32, Value::Int(v)) => i32::try_from(*v).is_ok(),
            (ScalarType::Int64, Value::Int(_)) => true,
            (ScalarType::Float32 | ScalarType::Float64, Value::Float(_)) => true,
            (ScalarType::String, Value::String(_)) => true,
            (ScalarType::Bytes, Value::Bytes(_)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.optional {
            write!(f, "optional {}", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field / Schema
// ════════════════════════════════════════════════════════════════

/// A single field in a schema. `index` is its position in `Schema::fields`
/// and in the value vector of every `Struct` built on that schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    index: usize,
    field_type: FieldType,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// Shared handle to an immutable schema. Derived schemas are handed out
/// as the same `Arc` on every cache hit.
pub type SchemaRef = Arc<Schema>;

/// Named, versioned, ordered field list describing a `Struct`.
///
/// Immutable once built. Equality and hashing are structural over
/// name, version and the ordered `(name, type)` field list; `doc` is
/// carried along but does not take part.
#[derive(Debug, Clone)]
pub struct Schema {
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    fields: Vec<Field>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version && self.fields == other.fields
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.fields.hash(state);
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Copy of this schema with `name: field_type` appended after the
    /// existing fields. Name, version and doc are carried over.
    pub fn with_field(&self, name: &str, field_type: FieldType) -> Result<Schema, PluginError> {
        let mut builder = SchemaBuilder::from_basics(self);
        for field in &self.fields {
            builder = builder.field(field.name.clone(), field.field_type);
        }
        builder.field(name, field_type).build()
    }
}

/// Builder for `Schema`. Field order is declaration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    fields: Vec<(String, FieldType)>,
}

impl SchemaBuilder {
    /// Builder seeded with the name, version and doc of `schema` (no fields).
    pub fn from_basics(schema: &Schema) -> Self {
        Self {
            name: schema.name.clone(),
            version: schema.version,
            doc: schema.doc.clone(),
            fields: Vec::with_capacity(schema.fields.len() + 1),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push((name.into(), field_type));
        self
    }

    /// Validate field names (non-empty, unique) and freeze the schema.
    pub fn build(self) -> Result<Schema, PluginError> {
        let mut fields: Vec<Field> = Vec::with_capacity(self.fields.len());
        for (index, (name, field_type)) in self.fields.into_iter().enumerate() {
            if name.is_empty() {
                return Err(PluginError::schema("field name must not be empty"));
            }
            if fields.iter().any(|f| f.name == name) {
                return Err(PluginError::schema(format!("duplicate field name '{name}'")));
            }
            fields.push(Field { name, index, field_type });
        }
        Ok(Schema {
            name: self.name,
            version: self.version,
            doc: self.doc,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::builder()
            .name("name")
            .version(1)
            .doc("doc")
            .field("magic", FieldType::optional(ScalarType::Int64))
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::builder()
            .field("a", FieldType::required(ScalarType::Int32))
            .field("a", FieldType::required(ScalarType::String))
            .build()
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Schema);
        assert!(err.message.contains("'a'"));
    }

    #[test]
    fn test_with_field_keeps_basics_and_order() {
        let derived = sample()
            .with_field("ts", FieldType::required(ScalarType::Int64))
            .unwrap();
        assert_eq!(derived.name(), Some("name"));
        assert_eq!(derived.version(), Some(1));
        assert_eq!(derived.doc(), Some("doc"));
        let names: Vec<&str> = derived.fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["magic", "ts"]);
        assert_eq!(derived.field("ts").unwrap().index(), 1);
    }

    #[test]
    fn test_structural_equality_ignores_doc() {
        let a = sample();
        let b = Schema::builder()
            .name("name")
            .version(1)
            .doc("other doc")
            .field("magic", FieldType::optional(ScalarType::Int64))
            .build()
            .unwrap();
        assert_eq!(a, b);

        let c = Schema::builder()
            .name("name")
            .version(2)
            .field("magic", FieldType::optional(ScalarType::Int64))
            .build()
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_field_type_accepts() {
        let int8 = FieldType::required(ScalarType::Int8);
        assert!(int8.accepts(&Value::Int(127)));
        assert!(!int8.accepts(&Value::Int(128)));
        assert!(int8.accepts(&Value::Null));
        assert!(!FieldType::required(ScalarType::String).accepts(&Value::Int(1)));
    }
}
