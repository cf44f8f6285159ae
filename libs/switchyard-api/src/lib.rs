pub mod cache;
pub mod config;
pub mod error;
pub mod record;
pub mod requirements;
pub mod schema;
pub mod transform;
pub mod util;
pub mod value;

pub use switchyard_api_derive::ConfigParams;
