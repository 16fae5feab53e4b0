pub mod model;
pub mod service;

pub use model::{NormalizedScript, ScriptOrigin, ScriptSource};
pub use service::ContentNormalizer;
