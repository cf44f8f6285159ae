use serde::Deserialize;

use crate::error::EngineError;

/// Root pipeline configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Named predicates that transforms can be gated on.
    #[serde(default)]
    pub predicates: Vec<PredicateConfig>,

    /// Transforms, applied in declaration order.
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredicateConfig {
    pub name: String,
    /// Registry kind, e.g. `field-is-ip`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Flat option table handed to the unit's `configure`.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub name: String,
    /// Registry kind, e.g. `regex-router`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Name of a predicate from `predicates`; the transform only runs when it holds.
    #[serde(default)]
    pub predicate: Option<String>,
    /// Invert the predicate.
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_pipeline() {
        let config = PipelineConfig::parse(
            r#"
            [[predicates]]
            name = "has-ip"
            type = "field-is-ip"
            config = { field = "host", useValue = true }

            [[transforms]]
            name = "route"
            type = "regex-router"
            predicate = "has-ip"
            negate = true
            config = { fieldName = "environment", pattern = "prod", targetDestination = "prod-topic" }
            "#,
        )
        .unwrap();

        assert_eq!(config.predicates.len(), 1);
        assert_eq!(config.predicates[0].kind, "field-is-ip");
        let route = &config.transforms[0];
        assert_eq!(route.predicate.as_deref(), Some("has-ip"));
        assert!(route.negate);
        let options = route.config.as_ref().unwrap();
        assert_eq!(options["targetDestination"], "prod-topic");
    }

    #[test]
    fn test_empty_pipeline() {
        let config = PipelineConfig::parse("").unwrap();
        assert!(config.predicates.is_empty());
        assert!(config.transforms.is_empty());
    }

    #[test]
    fn test_missing_type_is_config_error() {
        let err = PipelineConfig::parse("[[transforms]]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
