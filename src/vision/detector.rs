//! Frame-difference motion detection
//!
//! Two temporally adjacent frames are differenced, reduced to a single
//! channel, blurred, thresholded and dilated into a binary motion mask.
//! Outer contours of that mask become candidate regions, and regions whose
//! contour area is below the configured minimum are dropped as noise.

use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::contour_area;
use imageproc::map::map_colors2;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::config::DetectionConfig;

/// A connected area of change between two frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRegion {
    /// Bounding box of the region's outer contour
    pub bounds: Rect,
    /// Area enclosed by the contour
    pub area: f64,
}

impl MotionRegion {
    /// Centre of the bounding box, rounded towards the top-left
    pub fn center(&self) -> (i64, i64) {
        (
            self.bounds.left() as i64 + (self.bounds.width() / 2) as i64,
            self.bounds.top() as i64 + (self.bounds.height() / 2) as i64,
        )
    }

    /// Whether the bounding box fully contains `rect`
    pub fn contains(&self, rect: &Rect) -> bool {
        self.bounds.left() <= rect.left()
            && self.bounds.top() <= rect.top()
            && self.bounds.right() >= rect.right()
            && self.bounds.bottom() >= rect.bottom()
    }
}

/// Output of one detection pass
#[derive(Debug, Clone, Default)]
pub struct MotionAnalysis {
    /// Every outer contour found in the mask, before area filtering
    pub contours: Vec<Vec<Point<i32>>>,
    /// Regions that passed the minimum-area filter
    pub regions: Vec<MotionRegion>,
}

impl MotionAnalysis {
    /// Check whether any region survived the area filter
    pub fn has_motion(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Motion detector with fixed pipeline parameters
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: DetectionConfig,
}

impl MotionDetector {
    /// Create a detector with the given pipeline parameters
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Get the pipeline parameters
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Regions of real motion between two frames
    pub fn detect(&self, frame_a: &RgbImage, frame_b: &RgbImage) -> Vec<MotionRegion> {
        self.analyze(frame_a, frame_b).regions
    }

    /// Run the full pipeline, keeping the unfiltered contours for annotation
    pub fn analyze(&self, frame_a: &RgbImage, frame_b: &RgbImage) -> MotionAnalysis {
        if frame_a.dimensions() != frame_b.dimensions() {
            log::warn!(
                "Frame size mismatch: {:?} vs {:?}, skipping detection",
                frame_a.dimensions(),
                frame_b.dimensions()
            );
            return MotionAnalysis::default();
        }

        let mask = self.motion_mask(frame_a, frame_b);

        let mut analysis = MotionAnalysis::default();
        for contour in find_contours::<i32>(&mask) {
            if contour.border_type != BorderType::Outer {
                continue;
            }
            let area = contour_area(&contour.points);
            if area >= self.config.min_contour_area {
                if let Some(bounds) = bounding_rect(&contour.points) {
                    analysis.regions.push(MotionRegion { bounds, area });
                }
            }
            analysis.contours.push(contour.points);
        }

        log::debug!(
            "Motion pass: {} contours, {} regions",
            analysis.contours.len(),
            analysis.regions.len()
        );
        analysis
    }

    /// Binary mask of changed pixels (255 = motion)
    pub fn motion_mask(&self, frame_a: &RgbImage, frame_b: &RgbImage) -> GrayImage {
        let diff = map_colors2(frame_a, frame_b, |a: Rgb<u8>, b: Rgb<u8>| {
            Rgb([a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2])])
        });
        let gray = imageops::grayscale(&diff);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma());
        let mask = threshold(&blurred, self.config.threshold, ThresholdType::Binary);
        if self.config.dilate_iterations == 0 {
            return mask;
        }
        // k passes of a 3x3 square element equal one LInf dilation of radius k
        dilate(&mask, Norm::LInf, self.config.dilate_iterations)
    }
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

/// Paint contour points onto a frame
pub fn draw_contours(frame: &mut RgbImage, contours: &[Vec<Point<i32>>], color: Rgb<u8>, thickness: u32) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    for contour in contours {
        for p in contour {
            for dy in 0..thickness as i32 {
                for dx in 0..thickness as i32 {
                    let (x, y) = (p.x + dx, p.y + dy);
                    if x >= 0 && y >= 0 && x < w && y < h {
                        frame.put_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
    }
}
