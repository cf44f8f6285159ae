use std::fmt;

/// Error kind for plugin errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required option absent or malformed. Raised before any record is processed.
    Config,
    /// Payload is not of the representation the unit expects.
    DataShape,
    /// Invalid schema construction or access to an undeclared field.
    Schema,
}

/// Plugin error, returned by all transform and configuration methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PluginError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::DataShape, message: msg.into() }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Schema, message: msg.into() }
    }

    pub fn is_data_shape(&self) -> bool {
        self.kind == ErrorKind::DataShape
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PluginError {}

impl From<std::sync::Arc<PluginError>> for PluginError {
    /// Shared errors come out of the schema cache's coalesced initializers.
    fn from(e: std::sync::Arc<PluginError>) -> Self {
        std::sync::Arc::unwrap_or_clone(e)
    }
}
