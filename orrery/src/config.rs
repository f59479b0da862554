//! Configuration types for the viewer
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a JSON file
//! only needs to name the values it overrides.

use crate::error::{AssetLoadError, ConfigurationError};
use crate::input::SPEED_LEVELS;
use crate::scale::ScaleThresholds;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrreryConfig {
    pub assets: AssetConfig,
    pub scale: ScaleConfig,
    pub simulation: SimulationConfig,
    pub camera: CameraConfig,
    pub viewport: ViewportConfig,
    pub galaxy: GalaxyConfig,
}

impl OrreryConfig {
    /// Load a configuration file and validate it
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading configuration from file");

        let json = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the frame loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let scale = &self.scale;
        if !scale.hysteresis.is_finite() || scale.hysteresis <= 1.0 {
            return Err(invalid("scale.hysteresis", "must be greater than 1"));
        }
        let [fade_start, fade_end] = scale.planet_label_fade_au;
        if !(fade_start.is_finite() && fade_end.is_finite()) || fade_start > fade_end {
            return Err(invalid(
                "scale.planet_label_fade_au",
                "expected two finite values in ascending order",
            ));
        }

        let sim = &self.simulation;
        if !sim.base_time_step.is_finite() || sim.base_time_step < 0.0 {
            return Err(invalid("simulation.base_time_step", "must be finite and >= 0"));
        }
        if sim.speed_level >= SPEED_LEVELS.len() {
            return Err(invalid(
                "simulation.speed_level",
                format!("must be below {}", SPEED_LEVELS.len()),
            ));
        }

        let cam = &self.camera;
        if !(cam.fov_y_degrees > 0.0 && cam.fov_y_degrees < 180.0) {
            return Err(invalid("camera.fov_y_degrees", "must lie in (0, 180)"));
        }
        if !(cam.z_near > 0.0 && cam.z_far > cam.z_near) {
            return Err(invalid("camera.z_near", "expected 0 < z_near < z_far"));
        }
        if !cam.initial_position.is_finite() || !cam.initial_target.is_finite() {
            return Err(invalid("camera.initial_position", "must be finite"));
        }
        if cam.initial_position == cam.initial_target {
            return Err(invalid(
                "camera.initial_position",
                "camera cannot start on its own target",
            ));
        }
        if !(cam.follow_lerp > 0.0 && cam.follow_lerp <= 1.0) {
            return Err(invalid("camera.follow_lerp", "must lie in (0, 1]"));
        }
        if cam.transition_seconds < 0.0 || cam.auto_zoom_seconds < 0.0 {
            return Err(invalid("camera.transition_seconds", "durations cannot be negative"));
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(invalid("viewport", "width and height must be non-zero"));
        }

        debug!("Configuration validated");
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Configuration for asset paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// Directory name for textures (relative to asset_root)
    pub textures_dir: String,
    /// Catalog file; the built-in catalog is used when absent
    pub catalog_file: Option<PathBuf>,
}

impl AssetConfig {
    /// Get the full path to a texture
    ///
    /// `relative` may contain subdirectories but must stay inside the
    /// textures directory.
    pub fn texture_path(&self, relative: &str) -> Result<PathBuf, ConfigurationError> {
        let candidate = Path::new(relative);
        let escapes = relative.is_empty()
            || relative.contains('\\')
            || candidate
                .components()
                .any(|component| !matches!(component, Component::Normal(_)));
        if escapes {
            return Err(ConfigurationError::UnsafePath(relative.to_string()));
        }

        let path = self.asset_root.join(&self.textures_dir).join(candidate);
        debug!(relative = relative, path = ?path, "Generated texture path");
        Ok(path)
    }

    /// Resolved catalog path, if a catalog file is configured
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog_file
            .as_ref()
            .map(|file| self.asset_root.join(file))
    }

    /// Check that the asset root and textures directory exist
    pub fn validate(&self) -> Result<(), AssetLoadError> {
        let textures_path = self.asset_root.join(&self.textures_dir);
        for dir in [&self.asset_root, &textures_path] {
            if !dir.is_dir() {
                return Err(AssetLoadError::MissingDirectory(dir.clone()));
            }
        }
        debug!(textures = ?textures_path, "Asset directories present");
        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            textures_dir: "textures".to_string(),
            catalog_file: None,
        }
    }
}

/// Which threshold table drives the scale classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalePreset {
    #[default]
    Realistic,
    Cinematic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub preset: ScalePreset,
    /// Ratio applied to exit thresholds, must be > 1
    pub hysteresis: f64,
    /// Planet labels fade out between these distances (AU)
    pub planet_label_fade_au: [f64; 2],
}

impl ScaleConfig {
    pub fn thresholds(&self) -> ScaleThresholds {
        match self.preset {
            ScalePreset::Realistic => ScaleThresholds::realistic(),
            ScalePreset::Cinematic => ScaleThresholds::cinematic(),
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            preset: ScalePreset::Realistic,
            hysteresis: 1.2,
            planet_label_fade_au: [450.0, 500.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Phase advance per tick is `rate * base_time_step * speed`
    pub base_time_step: f64,
    /// Seed for initial orbital phases and procedural layers
    pub seed: u64,
    pub start_paused: bool,
    /// Index into the speed level table
    pub speed_level: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_time_step: 0.1,
            seed: 0x5EED_0F_5015,
            start_paused: false,
            speed_level: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub initial_position: DVec3,
    pub initial_target: DVec3,
    /// Duration of a focus fly-to
    pub transition_seconds: f64,
    /// Duration of a regime auto-zoom
    pub auto_zoom_seconds: f64,
    /// Fraction of the remaining gap closed per frame while following
    pub follow_lerp: f64,
    pub drag_threshold_px: f64,
    /// Proxies at or below this opacity cannot be picked
    pub pick_opacity_threshold: f32,
    pub lock_to_focus: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 1e12,
            initial_position: DVec3::new(0.0, 20.0, 100.0),
            initial_target: DVec3::ZERO,
            transition_seconds: 1.5,
            auto_zoom_seconds: 3.0,
            follow_lerp: 0.1,
            drag_threshold_px: 5.0,
            pick_opacity_threshold: 0.1,
            lock_to_focus: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Sizes of the procedural layers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub thin_disk_stars: usize,
    pub thick_disk_stars: usize,
    pub bulge_stars: usize,
    pub halo_stars: usize,
    pub asteroid_count: usize,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            thin_disk_stars: 100_000,
            thick_disk_stars: 50_000,
            bulge_stars: 50_000,
            halo_stars: 1_000,
            asteroid_count: 5_000,
        }
    }
}
