use std::collections::HashSet;

use crate::error::PluginError;

/// Flat option map handed to `configure` by the host runtime.
///
/// Values may be strings, booleans or numbers; strings are coerced to the
/// declared parameter type.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Parameter type for unit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    I64,
    U64,
    F64,
    Str,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Bool => write!(f, "boolean"),
            ParamType::I64 => write!(f, "int"),
            ParamType::U64 => write!(f, "uint"),
            ParamType::F64 => write!(f, "double"),
            ParamType::Str => write!(f, "string"),
        }
    }
}

/// How much an operator should care about a parameter (documentation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamImportance {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ParamImportance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamImportance::High => write!(f, "high"),
            ParamImportance::Medium => write!(f, "medium"),
            ParamImportance::Low => write!(f, "low"),
        }
    }
}

/// Declaration of a single config parameter.
///
/// Units export these via `Configurable::describe_config()` so that
/// external tooling can validate and document options.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub param_type: ParamType,
    pub importance: ParamImportance,
    pub required: bool,
    /// Required string parameters flagged `non_empty` reject `""`.
    pub non_empty: bool,
    pub default: Option<ParamValue>,
    pub description: String,
}

/// Typed config value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::I64(v) => write!(f, "{v}"),
            ParamValue::U64(v) => write!(f, "{v}"),
            ParamValue::F64(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "\"{v}\""),
        }
    }
}

/// Validated config values, read by a unit's `from_config`.
///
/// Built from raw `Options` after validating against the unit's
/// `ConfigParam` declarations. Units read values via typed getters.
#[derive(Debug, Clone, Default)]
pub struct ConfigValues {
    entries: Vec<(String, ParamValue)>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Validate raw options against `params` and build typed values.
    ///
    /// - Rejects unknown keys (not declared in `params`).
    /// - Converts each present value to its declared `ParamType`.
    /// - Absent params take their default; absent required params fail.
    pub fn from_options(options: &Options, params: &[ConfigParam]) -> Result<Self, PluginError> {
        let known: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();
        for key in options.keys() {
            if !known.contains(key.as_str()) {
                return Err(PluginError::config(format!("unknown parameter '{key}'")));
            }
        }

        let mut values = ConfigValues::new();
        for param in params {
            match options.get(&param.name) {
                Some(raw) => values.set(&param.name, value_to_param_value(raw, param)?),
                None => {
                    if let Some(ref default) = param.default {
                        values.set(&param.name, default.clone());
                    } else if param.required {
                        return Err(PluginError::config(format!(
                            "missing required parameter '{}'",
                            param.name
                        )));
                    }
                }
            }
        }
        Ok(values)
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ParamValue::U64(v)) => Some(*v),
            Some(ParamValue::I64(v)) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ParamValue::F64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw value → typed value
// ---------------------------------------------------------------------------

fn value_to_param_value(
    val: &serde_json::Value,
    param: &ConfigParam,
) -> Result<ParamValue, PluginError> {
    let expected = |what: &str| {
        PluginError::config(format!(
            "parameter '{}': expected {what}, got {val}",
            param.name
        ))
    };

    match param.param_type {
        ParamType::Bool => match val {
            serde_json::Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            serde_json::Value::String(s) if s.trim().eq_ignore_ascii_case("true") => {
                Ok(ParamValue::Bool(true))
            }
            serde_json::Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                Ok(ParamValue::Bool(false))
            }
            _ => Err(expected("bool")),
        },
        ParamType::I64 => match val {
            serde_json::Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(ParamValue::I64)
                .map_err(|_| expected("integer")),
            _ => val.as_i64().map(ParamValue::I64).ok_or_else(|| expected("integer")),
        },
        ParamType::U64 => match val {
            serde_json::Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map(ParamValue::U64)
                .map_err(|_| expected("non-negative integer")),
            _ => val
                .as_u64()
                .map(ParamValue::U64)
                .ok_or_else(|| expected("non-negative integer")),
        },
        ParamType::F64 => match val {
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(ParamValue::F64)
                .map_err(|_| expected("float")),
            _ => val.as_f64().map(ParamValue::F64).ok_or_else(|| expected("float")),
        },
        ParamType::Str => {
            let s = match val {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return Err(expected("string")),
            };
            if param.non_empty && s.is_empty() {
                return Err(PluginError::config(format!(
                    "parameter '{}': string must be non-empty",
                    param.name
                )));
            }
            Ok(ParamValue::Str(s))
        }
    }
}
