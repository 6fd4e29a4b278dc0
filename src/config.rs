//! Configuration types for the game
//!
//! These types define the structure of game configurations loaded from TOML files.
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock game.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Top-level game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub detection: DetectionConfig,
    pub display: DisplayConfig,
    pub assets: AssetConfig,
    pub audio: AudioConfig,
    pub face: FaceConfig,
}

/// Phase durations and loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Length of the GREEN phase in milliseconds
    pub green_duration_ms: u64,
    /// Length of the RED phase in milliseconds
    pub red_duration_ms: u64,
    /// Per-frame wait used to poll for the quit signal
    pub frame_wait_ms: u64,
    /// Pause after the elimination sound finishes
    pub elimination_pause_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            green_duration_ms: 5000,
            red_duration_ms: 5000,
            frame_wait_ms: 1,
            elimination_pause_ms: 2000,
        }
    }
}

impl TimingConfig {
    pub fn green_duration(&self) -> Duration {
        Duration::from_millis(self.green_duration_ms)
    }

    pub fn red_duration(&self) -> Duration {
        Duration::from_millis(self.red_duration_ms)
    }

    pub fn frame_wait(&self) -> Duration {
        Duration::from_millis(self.frame_wait_ms)
    }

    pub fn elimination_pause(&self) -> Duration {
        Duration::from_millis(self.elimination_pause_ms)
    }
}

/// Motion detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Regions with a smaller contour area are treated as sensor noise
    pub min_contour_area: f64,
    /// Gaussian kernel size (odd, in pixels)
    pub blur_kernel: u32,
    /// Intensity above which a difference pixel counts as changed
    pub threshold: u8,
    /// Number of 3x3 dilation passes over the binary mask
    pub dilate_iterations: u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 3000.0,
            blur_kernel: 5,
            threshold: 20,
            dilate_iterations: 3,
        }
    }
}

impl DetectionConfig {
    /// Gaussian sigma for the configured kernel size.
    ///
    /// Uses the usual zero-sigma rule `0.3 * ((k - 1) * 0.5 - 1) + 0.8`, so a
    /// 5x5 kernel blurs with sigma 1.1. Even kernels are rounded up to odd.
    pub fn blur_sigma(&self) -> f32 {
        let k = (self.blur_kernel | 1) as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

/// Window and on-screen layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Thickness of the phase-coloured border
    pub border_thickness: u32,
    /// Top-left position of the doll overlay
    pub doll_anchor: (i64, i64),
    /// Vertical centre of the "you lost" banner
    pub banner_y: i32,
    /// Height of the "you lost" banner
    pub banner_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_width: 1200,
            window_height: 750,
            border_thickness: 15,
            doll_anchor: (0, 50),
            banner_y: 430,
            banner_height: 60,
        }
    }
}

/// Overlay image assets and their scale factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the relative asset paths are resolved against
    pub root: PathBuf,
    pub impact_image: PathBuf,
    pub impact_scale: f32,
    pub doll_front_image: PathBuf,
    pub doll_front_scale: f32,
    pub doll_back_image: PathBuf,
    pub doll_back_scale: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            impact_image: PathBuf::from("images/bullet_hole.png"),
            impact_scale: 0.3,
            doll_front_image: PathBuf::from("images/front.png"),
            doll_front_scale: 0.5,
            doll_back_image: PathBuf::from("images/back.png"),
            doll_back_scale: 0.5,
        }
    }
}

impl AssetConfig {
    /// Resolve an asset path against the asset root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Sound tracks and the alert beep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub background_music: PathBuf,
    pub elimination_sound: PathBuf,
    pub beep_frequency_hz: u32,
    pub beep_duration_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            background_music: PathBuf::from("audio/background.mp3"),
            elimination_sound: PathBuf::from("audio/gun.mp3"),
            beep_frequency_hz: 1000,
            beep_duration_ms: 200,
        }
    }
}

/// Which face locator feeds the glow annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorKind {
    /// Pretrained SeetaFace frontal cascade loaded from `face.model`
    Model,
    /// Skin-colour blob heuristic, needs no model file
    SkinTone,
}

/// Face glow annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    pub enabled: bool,
    pub locator: LocatorKind,
    /// Model file, relative to the asset root
    pub model: PathBuf,
    /// Minimum classifier score for a window to count as a face
    pub score_threshold: f64,
    /// Image pyramid downscale factor between detection passes
    pub pyramid_scale: f32,
    /// Sliding-window step in pixels
    pub window_step: u32,
    /// Number of concentric rings per face
    pub rings: u32,
    /// Radius added per ring
    pub ring_spacing: u32,
    pub ring_thickness: u32,
    /// Green-channel difference between neighbouring rings
    pub intensity_step: u8,
    /// Smallest face side length the locator reports
    pub min_face_size: u32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locator: LocatorKind::Model,
            model: PathBuf::from("models/seeta_fd_frontal_v1.0.bin"),
            score_threshold: 2.0,
            pyramid_scale: 0.8,
            window_step: 4,
            rings: 5,
            ring_spacing: 15,
            ring_thickness: 2,
            intensity_step: 50,
            min_face_size: 30,
        }
    }
}

impl GameConfig {
    /// Load a game configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set both phase durations
    pub fn with_durations(mut self, green: Duration, red: Duration) -> Self {
        self.timing.green_duration_ms = green.as_millis() as u64;
        self.timing.red_duration_ms = red.as_millis() as u64;
        self
    }

    /// Set the minimum contour area
    pub fn with_min_contour_area(mut self, area: f64) -> Self {
        self.detection.min_contour_area = area;
        self
    }

    /// Set the asset root directory
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets.root = root.into();
        self
    }

    /// Set the doll anchor position
    pub fn with_doll_anchor(mut self, x: i64, y: i64) -> Self {
        self.display.doll_anchor = (x, y);
        self
    }

    /// Check values that would make the game loop or the pipeline misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.green_duration_ms == 0 {
            return Err(ConfigError::invalid("timing.green_duration_ms", "must be positive"));
        }
        if self.timing.red_duration_ms == 0 {
            return Err(ConfigError::invalid("timing.red_duration_ms", "must be positive"));
        }
        if self.detection.blur_kernel == 0 {
            return Err(ConfigError::invalid("detection.blur_kernel", "must be positive"));
        }
        if !(self.detection.min_contour_area >= 0.0) {
            return Err(ConfigError::invalid(
                "detection.min_contour_area",
                "must be zero or positive",
            ));
        }
        for (field, scale) in [
            ("assets.impact_scale", self.assets.impact_scale),
            ("assets.doll_front_scale", self.assets.doll_front_scale),
            ("assets.doll_back_scale", self.assets.doll_back_scale),
        ] {
            if !(scale > 0.0) {
                return Err(ConfigError::invalid(field, format!("scale {} must be positive", scale)));
            }
        }
        if self.display.window_width == 0 || self.display.window_height == 0 {
            return Err(ConfigError::invalid("display", "window dimensions must be non-zero"));
        }
        if !(self.face.pyramid_scale > 0.0 && self.face.pyramid_scale < 1.0) {
            return Err(ConfigError::invalid(
                "face.pyramid_scale",
                format!("{} must lie strictly between 0 and 1", self.face.pyramid_scale),
            ));
        }
        if self.face.window_step == 0 {
            return Err(ConfigError::invalid("face.window_step", "must be at least 1"));
        }
        Ok(())
    }
}
