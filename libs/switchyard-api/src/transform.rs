use crate::config::{ConfigParam, Options};
use crate::error::PluginError;
use crate::record::Record;

/// Record transform: a pure, synchronous function of (configuration,
/// record, internal cache state).
///
/// The input record is never altered; the result is either a new record
/// or a clone of the input when the transform does not apply.
/// Implementations must be safe to share across worker threads.
pub trait Transformation: Send + Sync {
    fn apply(&self, record: &Record) -> Result<Record, PluginError>;
}

/// Record predicate. Never fails: anything it cannot classify is `false`.
pub trait Predicate: Send + Sync {
    fn test(&self, record: &Record) -> bool;
}

/// Unit constructed from a flat option map.
///
/// `configure` either returns a fully configured unit or a config error;
/// there is no partially configured state.
pub trait Configurable: Sized {
    /// Declared options, for validation and documentation tooling.
    fn describe_config() -> Vec<ConfigParam>;

    fn configure(options: &Options) -> Result<Self, PluginError>;
}
