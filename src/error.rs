//! Error types for the game

use std::path::PathBuf;

use thiserror::Error;

/// Result type for game operations
pub type Result<T> = std::result::Result<T, GameError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Error type for everything outside the per-tick detection pipeline.
///
/// Asset, face-model, config and audio-device errors are fatal at startup. `Capture` and
/// `Display` are produced by collaborators mid-session and are handled by the
/// game loop without ending the session.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Image file {0} not found")]
    AssetNotFound(PathBuf),

    #[error("Failed to decode {path}: {source}")]
    AssetDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Scaled image dimensions are invalid: {width}x{height} for {path}")]
    DegenerateAsset {
        path: PathBuf,
        width: i64,
        height: i64,
    },

    #[error("Failed to load face model {path}: {reason}")]
    FaceModel { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error accessing the camera: {0}")]
    Capture(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Audio error: {0}")]
    Audio(String),
}
