//! Overlay image assets
//!
//! The three overlays are loaded and scaled once at startup. Any problem here
//! is fatal: the game never starts with a missing or degenerate overlay.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::config::AssetConfig;
use crate::error::{GameError, Result};

/// The pre-scaled overlays shared by every frame
#[derive(Debug, Clone)]
pub struct Overlays {
    /// Marker composited at the centre of each motion region
    pub impact: RgbaImage,
    /// Doll facing the players, shown during RED
    pub doll_front: RgbaImage,
    /// Doll facing away, shown during GREEN
    pub doll_back: RgbaImage,
}

impl Overlays {
    /// Load and scale all overlays named in `config`
    pub fn load(config: &AssetConfig) -> Result<Self> {
        Ok(Self {
            impact: prepare_image(&config.resolve(&config.impact_image), config.impact_scale)?,
            doll_front: prepare_image(&config.resolve(&config.doll_front_image), config.doll_front_scale)?,
            doll_back: prepare_image(&config.resolve(&config.doll_back_image), config.doll_back_scale)?,
        })
    }
}

/// Read an image with its alpha channel and scale it by `scale`
pub fn prepare_image(path: &Path, scale: f32) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(GameError::AssetNotFound(path.to_path_buf()));
    }

    let image = image::open(path)
        .map_err(|source| GameError::AssetDecode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    scale_image(&image, scale).map_err(|(width, height)| GameError::DegenerateAsset {
        path: path.to_path_buf(),
        width,
        height,
    })
}

/// Scale an image, truncating the new dimensions. Errors with the computed
/// size when either side would be zero or negative.
pub fn scale_image(image: &RgbaImage, scale: f32) -> std::result::Result<RgbaImage, (i64, i64)> {
    let width = (image.width() as f64 * scale as f64) as i64;
    let height = (image.height() as f64 * scale as f64) as i64;
    if width <= 0 || height <= 0 {
        return Err((width, height));
    }
    if (width as u32, height as u32) == image.dimensions() {
        return Ok(image.clone());
    }
    log::debug!(
        "Scaling overlay {}x{} -> {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    Ok(imageops::resize(image, width as u32, height as u32, FilterType::Triangle))
}
