//! Shape checks shared by the transforms. Each failure is a data-shape
//! error naming the operation (`purpose`) and the shape actually found.

use crate::error::PluginError;
use crate::record::Data;
use crate::value::{Mapping, Struct, Value};

/// Require a Dynamic Mapping Value.
pub fn require_map<'a>(data: &'a Data, purpose: &str) -> Result<&'a Mapping, PluginError> {
    match data {
        Data::Dynamic(Value::Map(m)) => Ok(m),
        other => Err(PluginError::data_shape(format!(
            "only map objects supported in absence of schema for [{purpose}], found: {}",
            other.shape_name()
        ))),
    }
}

/// Require a Structured Value.
pub fn require_struct<'a>(data: &'a Data, purpose: &str) -> Result<&'a Struct, PluginError> {
    match data {
        Data::Structured(s) => Ok(s),
        other => Err(PluginError::data_shape(format!(
            "only struct objects supported for [{purpose}], found: {}",
            other.shape_name()
        ))),
    }
}
