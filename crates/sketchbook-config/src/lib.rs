//! Configuration system for the Sketchbook camera and shadow core.
//!
//! Settings persist to disk as RON files and can be overridden from the
//! command line via clap. Every section uses `#[serde(default)]` so older
//! files keep loading when new fields appear.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, InputConfig, ShadowConfig, SplitMode, default_config_dir,
};
pub use error::ConfigError;
