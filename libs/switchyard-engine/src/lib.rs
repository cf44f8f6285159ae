pub mod chain;
pub mod config;
pub mod error;
pub mod registry;

pub use chain::TransformChain;
pub use config::PipelineConfig;
pub use error::EngineError;
pub use registry::Registry;
