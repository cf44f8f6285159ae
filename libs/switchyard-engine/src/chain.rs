use std::collections::HashMap;
use std::sync::Arc;

use switchyard_api::record::Record;
use switchyard_api::transform::{Predicate, Transformation};

use crate::config::PipelineConfig;
use crate::error::EngineError;
use crate::registry::Registry;

/// One configured transform plus its optional gate.
struct Stage {
    name: String,
    transform: Arc<dyn Transformation>,
    predicate: Option<(String, Arc<dyn Predicate>)>,
    negate: bool,
}

impl Stage {
    /// The transform runs when the predicate result differs from `negate`.
    /// Ungated stages always run.
    fn should_run(&self, record: &Record) -> bool {
        match &self.predicate {
            Some((_, predicate)) => predicate.test(record) != self.negate,
            None => true,
        }
    }
}

/// Ordered list of transforms built from a [`PipelineConfig`].
pub struct TransformChain {
    stages: Vec<Stage>,
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformChain")
            .field("stages", &self.names())
            .finish()
    }
}

impl TransformChain {
    /// Instantiate every predicate and transform the configuration declares.
    ///
    /// Duplicate names, unknown kinds, and transforms gated on an
    /// undeclared predicate are rejected before any record flows.
    pub fn from_config(config: &PipelineConfig, registry: &Registry) -> Result<Self, EngineError> {
        // --- 1. Predicates ---
        let mut predicates: HashMap<&str, Arc<dyn Predicate>> = HashMap::new();
        for pred_cfg in &config.predicates {
            let ctx = format!("predicate '{}'", pred_cfg.name);
            if predicates.contains_key(pred_cfg.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate predicate name '{}'",
                    pred_cfg.name
                )));
            }
            let predicate = registry
                .create_predicate(&pred_cfg.kind, pred_cfg.config.as_ref())
                .map_err(|e| e.with_context(&ctx))?;
            tracing::info!(predicate = %pred_cfg.name, kind = %pred_cfg.kind, "created predicate");
            predicates.insert(pred_cfg.name.as_str(), predicate);
        }

        // --- 2. Transforms ---
        let mut stages: Vec<Stage> = Vec::with_capacity(config.transforms.len());
        for xform_cfg in &config.transforms {
            let ctx = format!("transform '{}'", xform_cfg.name);
            if stages.iter().any(|s| s.name == xform_cfg.name) {
                return Err(EngineError::Config(format!(
                    "duplicate transform name '{}'",
                    xform_cfg.name
                )));
            }

            let predicate = match &xform_cfg.predicate {
                Some(pred_name) => {
                    let predicate = predicates.get(pred_name.as_str()).ok_or_else(|| {
                        EngineError::UnknownPredicate {
                            transform: xform_cfg.name.clone(),
                            predicate: pred_name.clone(),
                        }
                    })?;
                    Some((pred_name.clone(), Arc::clone(predicate)))
                }
                None => {
                    if xform_cfg.negate {
                        tracing::warn!(
                            transform = %xform_cfg.name,
                            "negate has no effect without a predicate"
                        );
                    }
                    None
                }
            };

            let transform = registry
                .create_transform(&xform_cfg.kind, xform_cfg.config.as_ref())
                .map_err(|e| e.with_context(&ctx))?;

            tracing::info!(
                transform = %xform_cfg.name,
                kind = %xform_cfg.kind,
                predicate = ?xform_cfg.predicate,
                negate = xform_cfg.negate,
                "created transform"
            );
            stages.push(Stage {
                name: xform_cfg.name.clone(),
                transform,
                predicate,
                negate: xform_cfg.negate,
            });
        }

        Ok(Self { stages })
    }

    /// Run a record through every stage in order.
    ///
    /// The first failing stage aborts the chain; its error names the stage.
    pub fn apply(&self, record: &Record) -> Result<Record, EngineError> {
        let mut current = record.clone();
        for stage in &self.stages {
            if !stage.should_run(&current) {
                tracing::trace!(
                    transform = %stage.name,
                    predicate = ?stage.predicate.as_ref().map(|(name, _)| name),
                    "skipped"
                );
                continue;
            }
            current = stage.transform.apply(&current).map_err(|e| {
                EngineError::Plugin(e).with_context(format!("transform '{}'", stage.name))
            })?;
        }
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}
