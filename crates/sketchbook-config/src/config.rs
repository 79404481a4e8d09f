//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Cascaded shadow map settings.
    pub shadows: ShadowConfig,
    /// Orbit / free-fly camera settings.
    pub camera: CameraConfig,
    /// Input settings.
    pub input: InputConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// How the view frustum depth range is divided into cascades.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum SplitMode {
    /// Equal slices in view-space depth.
    Uniform,
    /// Geometric progression from near to far.
    Logarithmic,
    /// Blend of uniform and logarithmic weighted by `practical_lambda`.
    #[default]
    Practical,
    /// Breaks produced by a caller-supplied callback.
    Custom,
}

/// Cascaded shadow map configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Active cascade count.
    pub cascades: u32,
    /// Cascade slots reserved in the shader uniform array.
    pub max_cascades: u32,
    /// Shadows are never cast beyond this view distance.
    pub max_far: f32,
    /// Split scheme.
    pub split_mode: SplitMode,
    /// Weight of the logarithmic scheme in practical mode, `0.0..=1.0`.
    pub practical_lambda: f32,
    /// Shadow map resolution (width = height) per cascade.
    pub shadow_map_size: u32,
    /// Depth bias per world unit of cascade width.
    pub shadow_bias: f32,
    /// Normal bias per world unit of cascade width.
    pub shadow_normal_bias: f32,
    /// Direction the light travels in (not necessarily normalized).
    pub light_direction: [f32; 3],
    /// Up vector used to orient the light.
    pub light_up: [f32; 3],
    /// Linear RGB light color.
    pub light_color: [f32; 3],
    /// Light intensity multiplier.
    pub light_intensity: f32,
    /// Extra depth behind each cascade so off-screen casters still land in the map.
    pub light_margin: f32,
    /// Widen each cascade to leave room for blending between cascades.
    pub fade: bool,
    /// Let the last cascade extend to infinity in the shader.
    pub no_last_cascade_cutoff: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cascades: 3,
            max_cascades: 3,
            max_far: 100_000.0,
            split_mode: SplitMode::Practical,
            practical_lambda: 0.5,
            shadow_map_size: 2048,
            shadow_bias: 0.0,
            shadow_normal_bias: 0.0,
            light_direction: [1.0, -1.0, 1.0],
            light_up: [0.0, 1.0, 0.0],
            light_color: [1.0, 1.0, 1.0],
            light_intensity: 1.0,
            light_margin: 200.0,
            fade: false,
            no_last_cascade_cutoff: false,
        }
    }
}

/// Camera controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal pointer sensitivity.
    pub sensitivity_x: f32,
    /// Vertical pointer sensitivity.
    pub sensitivity_y: f32,
    /// Initial orbit radius.
    pub radius: f32,
    /// Free-fly base speed per 1/60 s step.
    pub movement_speed: f32,
    /// Global free-fly speed multiplier.
    pub free_cam_speed: f32,
    /// Quiet period after manual rotation before auto-follow resumes, in ms.
    pub auto_rotate_delay_ms: u64,
    /// Slerp factor used while auto-follow converges.
    pub auto_rotate_lerp: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity_x: 1.0,
            sensitivity_y: 0.8,
            radius: 3.0,
            movement_speed: 0.06,
            free_cam_speed: 1.0,
            auto_rotate_delay_ms: 400,
            auto_rotate_lerp: 0.1,
        }
    }
}

/// Input configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Invert the vertical orbit axis.
    pub invert_y: bool,
    /// Keybinding overrides (action name -> key name).
    pub keybindings: HashMap<String, String>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to this directory.
    pub log_dir: Option<PathBuf>,
    /// Emit cascade debug geometry each frame.
    pub show_cascades: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            show_cascades: false,
        }
    }
}

/// Platform config directory for Sketchbook, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sketchbook"))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shadows = &self.shadows;
        if shadows.cascades == 0 {
            return Err(invalid("shadows.cascades", "must be at least 1"));
        }
        if shadows.max_cascades < shadows.cascades {
            return Err(invalid(
                "shadows.max_cascades",
                format!("{} is below cascades ({})", shadows.max_cascades, shadows.cascades),
            ));
        }
        if !(0.0..=1.0).contains(&shadows.practical_lambda) {
            return Err(invalid("shadows.practical_lambda", "must be within 0.0..=1.0"));
        }
        if shadows.max_far.is_nan() || shadows.max_far <= 0.0 {
            return Err(invalid("shadows.max_far", "must be positive"));
        }
        if shadows.shadow_map_size == 0 {
            return Err(invalid("shadows.shadow_map_size", "must be non-zero"));
        }
        if shadows.light_direction.iter().all(|c| *c == 0.0) {
            return Err(invalid("shadows.light_direction", "must not be zero"));
        }
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
