//! Vision pipeline
//!
//! Everything that looks at or draws on frames: alpha compositing, the
//! frame-difference motion detector, face glow annotation, and the camera
//! sources that feed them.

pub mod capture;
pub mod compositor;
pub mod detector;
pub mod face;

// Re-export main types for convenient access
pub use capture::{CameraSource, FrameSequenceCamera};
pub use compositor::{composite, composite_centered, draw_banner, draw_border};
pub use detector::{draw_contours, MotionAnalysis, MotionDetector, MotionRegion};
pub use face::{open_locator, FaceHighlighter, FaceLocator, SeetaFaceLocator, SkinToneLocator};
