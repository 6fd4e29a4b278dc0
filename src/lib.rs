//! Red Light, Green Light
//!
//! A camera-driven "don't move" game. During GREEN the players may move;
//! during RED every pair of consecutive camera frames is differenced and any
//! sufficiently large region of motion eliminates the player.
//!
//! The crate is split into:
//! - [`vision`] - compositing, motion detection, face glow, camera sources
//! - [`feedback`] - display and audio sinks
//! - [`core`] - the phase state machine and the game loop
//!
//! Camera, display, audio and time are all traits, so a whole session can be
//! replayed deterministically from synthetic frames.

pub mod assets;
pub mod config;
pub mod core;
pub mod error;
pub mod feedback;
pub mod vision;

// Re-export commonly used types
pub use assets::Overlays;
pub use config::GameConfig;
pub use crate::core::{Game, GameBuilder, Phase, PhaseController, SessionEvent, SessionOutcome};
pub use error::{ConfigError, GameError, Result};
pub use vision::{MotionDetector, MotionRegion};
