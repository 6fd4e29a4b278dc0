//! Output collaborators: where finished frames and sounds go

pub mod audio;
pub mod display;

#[cfg(feature = "audio")]
pub use audio::RodioAudio;
pub use audio::{AudioSink, SilentAudio};
pub use display::{DisplaySink, FrameDumpDisplay, QuitSignal};
