//! Face glow annotation
//!
//! Purely decorative. A [`FaceLocator`] finds face rectangles and the
//! highlighter draws concentric rings around each one, brighter towards the
//! centre. Nothing here feeds back into elimination.
//!
//! The default locator runs the pretrained SeetaFace frontal cascade through
//! `rustface`. [`SkinToneLocator`] is a model-free fallback selected with
//! `face.locator = "skin-tone"`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{imageops, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::drawing::draw_hollow_circle_mut;
use imageproc::rect::Rect;
use rustface::{Detector, ImageData};

use crate::config::{AssetConfig, FaceConfig, LocatorKind};
use crate::error::{GameError, Result};

/// Pluggable face-region locator
pub trait FaceLocator {
    /// Face rectangles found in `frame`; an empty vec is a normal result
    fn locate(&mut self, frame: &RgbImage) -> Vec<Rect>;
}

/// Build the locator selected by `config`.
///
/// A missing or unreadable model file is a startup error.
pub fn open_locator(config: &FaceConfig, assets: &AssetConfig) -> Result<Box<dyn FaceLocator>> {
    match config.locator {
        LocatorKind::Model => {
            let path = assets.resolve(&config.model);
            Ok(Box::new(SeetaFaceLocator::from_file(&path, config)?))
        }
        LocatorKind::SkinTone => {
            log::info!("Using skin-tone face locator");
            Ok(Box::new(SkinToneLocator::new(config.min_face_size)))
        }
    }
}

/// Pretrained frontal face detector (SeetaFace funnel-structured cascade)
pub struct SeetaFaceLocator {
    detector: Box<dyn Detector>,
}

impl SeetaFaceLocator {
    /// Load the cascade model from `path` and apply the detection settings
    pub fn from_file(path: &Path, config: &FaceConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(GameError::AssetNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| GameError::FaceModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|e| GameError::FaceModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(config.min_face_size.max(20));
        detector.set_score_thresh(config.score_threshold);
        detector.set_pyramid_scale_factor(config.pyramid_scale);
        detector.set_slide_window_step(config.window_step, config.window_step);

        log::info!("Loaded face model {}", path.display());
        Ok(Self { detector })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(&mut self, frame: &RgbImage) -> Vec<Rect> {
        let gray = imageops::grayscale(frame);
        let mut image = ImageData::new(gray.as_raw(), gray.width(), gray.height());

        self.detector
            .detect(&mut image)
            .into_iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                if bbox.width() == 0 || bbox.height() == 0 {
                    return None;
                }
                Some(Rect::at(bbox.x(), bbox.y()).of_size(bbox.width(), bbox.height()))
            })
            .collect()
    }
}

impl std::fmt::Debug for SeetaFaceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeetaFaceLocator").finish_non_exhaustive()
    }
}

/// Model-free fallback that finds skin-coloured blobs of face-like size and shape.
///
/// It cannot tell a face from any other skin-toned patch and misses faces
/// that merge with neighbouring skin, so it is only meant for setups without
/// the model file.
#[derive(Debug, Clone)]
pub struct SkinToneLocator {
    /// Smallest accepted side length
    min_size: u32,
    /// Accepted width/height ratio range
    aspect: (f32, f32),
}

impl SkinToneLocator {
    /// Create a locator rejecting blobs narrower or shorter than `min_size`
    pub fn new(min_size: u32) -> Self {
        Self {
            min_size,
            aspect: (0.5, 1.6),
        }
    }

    fn is_skin(px: &Rgb<u8>) -> bool {
        let [r, g, b] = px.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        r > 95 && g > 40 && b > 20 && max - min > 15 && r.abs_diff(g) > 15 && r > g && r > b
    }
}

impl Default for SkinToneLocator {
    fn default() -> Self {
        Self::new(30)
    }
}

impl FaceLocator for SkinToneLocator {
    fn locate(&mut self, frame: &RgbImage) -> Vec<Rect> {
        let mask = image::GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            image::Luma([if Self::is_skin(frame.get_pixel(x, y)) { 255 } else { 0 }])
        });

        find_contours::<i32>(&mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .filter_map(|c| {
                let min_x = c.points.iter().map(|p| p.x).min()?;
                let max_x = c.points.iter().map(|p| p.x).max()?;
                let min_y = c.points.iter().map(|p| p.y).min()?;
                let max_y = c.points.iter().map(|p| p.y).max()?;
                let (w, h) = ((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32);
                if w < self.min_size || h < self.min_size {
                    return None;
                }
                let ratio = w as f32 / h as f32;
                if ratio < self.aspect.0 || ratio > self.aspect.1 {
                    return None;
                }
                Some(Rect::at(min_x, min_y).of_size(w, h))
            })
            .collect()
    }
}

/// Draws the glow rings around located faces
pub struct FaceHighlighter {
    locator: Box<dyn FaceLocator>,
    config: FaceConfig,
}

impl FaceHighlighter {
    /// Create a highlighter drawing rings around whatever `locator` finds
    pub fn new(locator: Box<dyn FaceLocator>, config: FaceConfig) -> Self {
        Self { locator, config }
    }

    /// Annotate every face found in `frame`, returning how many were found
    pub fn highlight(&mut self, frame: &mut RgbImage) -> usize {
        if !self.config.enabled {
            return 0;
        }
        let faces = self.locator.locate(frame);
        for face in &faces {
            draw_glow(frame, face, &self.config);
        }
        faces.len()
    }
}

impl std::fmt::Debug for FaceHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceHighlighter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Concentric rings around `face`; the innermost ring has the strongest green
/// channel and each ring further out drops by `intensity_step`
fn draw_glow(frame: &mut RgbImage, face: &Rect, config: &FaceConfig) {
    let center = (
        face.left() + (face.width() / 2) as i32,
        face.top() + (face.height() / 2) as i32,
    );
    let base = (face.width().max(face.height()) / 2) as i32;

    for i in 1..=config.rings {
        let level = config.rings - i + 1;
        let intensity = (level * config.intensity_step as u32).min(255) as u8;
        let color = Rgb([255, intensity, 0]);
        let radius = base + (i * config.ring_spacing) as i32;
        for t in 0..config.ring_thickness.max(1) as i32 {
            draw_hollow_circle_mut(frame, center, radius + t, color);
        }
    }
}
