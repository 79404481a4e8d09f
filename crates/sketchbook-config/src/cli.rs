//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, SplitMode};

/// Sketchbook command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "sketchbook", about = "Sketchbook camera and shadow core")]
pub struct CliArgs {
    /// Number of shadow cascades.
    #[arg(long)]
    pub cascades: Option<u32>,

    /// Cascade split scheme.
    #[arg(long, value_enum)]
    pub split_mode: Option<SplitMode>,

    /// Logarithmic weight for the practical split scheme.
    #[arg(long)]
    pub lambda: Option<f32>,

    /// Shadow map resolution per cascade.
    #[arg(long)]
    pub shadow_map_size: Option<u32>,

    /// Maximum shadow distance.
    #[arg(long)]
    pub max_far: Option<f32>,

    /// Enable cascade fade margins.
    #[arg(long)]
    pub fade: Option<bool>,

    /// Mouse sensitivity (vertical is derived as 0.8x).
    #[arg(long)]
    pub sensitivity: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(cascades) = args.cascades {
            self.shadows.cascades = cascades;
            self.shadows.max_cascades = self.shadows.max_cascades.max(cascades);
        }
        if let Some(mode) = args.split_mode {
            self.shadows.split_mode = mode;
        }
        if let Some(lambda) = args.lambda {
            self.shadows.practical_lambda = lambda.clamp(0.0, 1.0);
        }
        if let Some(size) = args.shadow_map_size {
            self.shadows.shadow_map_size = size;
        }
        if let Some(max_far) = args.max_far {
            self.shadows.max_far = max_far;
        }
        if let Some(fade) = args.fade {
            self.shadows.fade = fade;
        }
        if let Some(s) = args.sensitivity {
            self.camera.sensitivity_x = s;
            self.camera.sensitivity_y = s * 0.8;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
