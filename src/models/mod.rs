pub mod config;
pub mod data_uri;
pub mod generation;

pub use config::{ConfigError, IntensifyConfig, LossyConfig, MotionConfig};
pub use data_uri::{mime_for_file_name, DataUri};
pub use generation::GenerationResult;
