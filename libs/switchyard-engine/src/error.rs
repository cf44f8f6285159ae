use switchyard_api::error::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("unknown unit type: {0}")]
    UnknownUnit(String),

    #[error("transform '{transform}' references unknown predicate '{predicate}'")]
    UnknownPredicate { transform: String, predicate: String },

    /// A single input record that could not be decoded or encoded.
    #[error("record error: {0}")]
    Record(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Plugin` variant, context is added to the inner `PluginError`.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Plugin(e) => EngineError::Plugin(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::UnknownUnit(msg) => EngineError::UnknownUnit(format!("{ctx}: {msg}")),
            EngineError::Record(msg) => EngineError::Record(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    /// The per-record failure class, if this error came out of a unit.
    pub fn plugin_error(&self) -> Option<&PluginError> {
        match self {
            EngineError::Plugin(e) => Some(e),
            _ => None,
        }
    }
}
