//! Configuration: `AppConfig` and its sections, `AppPaths` for platform
//! directories, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, AudioConfig, OutputConfig, UploadConfig};
