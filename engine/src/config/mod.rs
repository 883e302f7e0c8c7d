// Engine configuration: embedded defaults, optional JSON overlay, environment overrides.
pub mod settings;

pub use settings::{EngineSettings, FailurePolicy};
