//! Display sinks

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{GameError, Result};

/// Trait for the surface composited frames are shown on
pub trait DisplaySink {
    /// Present a finished frame
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Wait up to `timeout` for user input; true if the user asked to quit
    fn poll_quit(&mut self, timeout: Duration) -> bool;
}

/// Shared quit flag that can be raised from any thread
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    /// Create a lowered quit flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether quit was requested
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writes every shown frame as a numbered PNG, scaled to the window size
pub struct FrameDumpDisplay {
    dir: PathBuf,
    window: (u32, u32),
    quit: QuitSignal,
    shown: u64,
}

impl FrameDumpDisplay {
    /// Create the output directory and start numbering frames from zero
    pub fn new(dir: &Path, window_width: u32, window_height: u32, quit: QuitSignal) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| GameError::Display(format!("{}: {}", dir.display(), e)))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            window: (window_width, window_height),
            quit,
            shown: 0,
        })
    }

    /// Number of frames written so far
    pub fn frames_shown(&self) -> u64 {
        self.shown
    }

    /// Get a handle to the quit flag this display reports
    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }
}

impl DisplaySink for FrameDumpDisplay {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.dir.join(format!("frame_{:06}.png", self.shown));
        self.shown += 1;

        let (w, h) = self.window;
        let result = if frame.dimensions() == (w, h) {
            frame.save(&path)
        } else {
            imageops::resize(frame, w, h, FilterType::Triangle).save(&path)
        };
        result.map_err(|e| GameError::Display(format!("{}: {}", path.display(), e)))
    }

    fn poll_quit(&mut self, timeout: Duration) -> bool {
        if !timeout.is_zero() {
            std::thread::sleep(timeout);
        }
        self.quit.is_triggered()
    }
}

impl Drop for FrameDumpDisplay {
    fn drop(&mut self) {
        log::debug!("Display closed after {} frames", self.shown);
    }
}
