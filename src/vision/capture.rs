//! Camera sources
//!
//! The game only needs something that can be polled for frames every tick.
//! [`FrameSequenceCamera`] replays a directory of still images, which stands in
//! for a webcam when running headless or recording test sessions.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{GameError, Result};

/// Trait for anything that yields frames on demand
pub trait CameraSource {
    /// Whether the device is still able to produce frames
    fn is_opened(&self) -> bool;

    /// Read the next frame. Failures are per-call and not fatal.
    fn read(&mut self) -> Result<RgbImage>;
}

/// Replays image files from a directory in file-name order
pub struct FrameSequenceCamera {
    frames: Vec<PathBuf>,
    position: usize,
    loop_playback: bool,
    opened: bool,
}

impl FrameSequenceCamera {
    /// Open every png/jpg/bmp file in `dir`
    pub fn from_directory(dir: &Path, loop_playback: bool) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| GameError::Capture(format!("{}: {}", dir.display(), e)))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image_file(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(GameError::Capture(format!(
                "no frames found in {}",
                dir.display()
            )));
        }

        log::info!("Frame sequence camera: {} frames from {}", frames.len(), dir.display());
        Ok(Self::from_paths(frames, loop_playback))
    }

    /// Build from an explicit list of frame files
    pub fn from_paths(frames: Vec<PathBuf>, loop_playback: bool) -> Self {
        let opened = !frames.is_empty();
        Self {
            frames,
            position: 0,
            loop_playback,
            opened,
        }
    }

    /// Number of frames in the sequence
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check whether the sequence has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Close the camera; later reads fail
    pub fn release(&mut self) {
        if self.opened {
            log::debug!("Releasing frame sequence camera");
        }
        self.opened = false;
    }
}

impl CameraSource for FrameSequenceCamera {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn read(&mut self) -> Result<RgbImage> {
        if !self.opened {
            return Err(GameError::Capture("camera closed".to_string()));
        }

        if self.position >= self.frames.len() {
            if self.loop_playback {
                self.position = 0;
            } else {
                self.release();
                return Err(GameError::Capture("end of frame sequence".to_string()));
            }
        }

        let path = &self.frames[self.position];
        self.position += 1;

        image::open(path)
            .map(|img| img.to_rgb8())
            .map_err(|e| GameError::Capture(format!("{}: {}", path.display(), e)))
    }
}

impl Drop for FrameSequenceCamera {
    fn drop(&mut self) {
        self.release();
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
        .unwrap_or(false)
}
