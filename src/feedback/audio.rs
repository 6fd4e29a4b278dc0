//! Audio collaborators
//!
//! The game loop only sees [`AudioSink`]. [`RodioAudio`] plays real sound
//! files and synthesises the alert beep; [`SilentAudio`] stands in when
//! audio is muted or the crate is built without the `audio` feature.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Trait for sound output used by the game
pub trait AudioSink {
    /// Start a track looping in the background, replacing any current track
    fn play_loop(&mut self, track: &Path) -> Result<()>;

    /// Play a track and block until it has finished
    fn play_to_completion(&mut self, track: &Path) -> Result<()>;

    /// Fire a short tone without waiting for it
    fn beep(&mut self, frequency_hz: u32, duration: Duration);

    /// Stop everything that is playing
    fn stop(&mut self);
}

/// Audio sink that only logs what it would play
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_loop(&mut self, track: &Path) -> Result<()> {
        log::debug!("(muted) loop {}", track.display());
        Ok(())
    }

    fn play_to_completion(&mut self, track: &Path) -> Result<()> {
        log::debug!("(muted) play {}", track.display());
        Ok(())
    }

    fn beep(&mut self, frequency_hz: u32, duration: Duration) {
        log::debug!("(muted) beep {} Hz for {:?}", frequency_hz, duration);
    }

    fn stop(&mut self) {}
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioAudio;

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;
    use std::time::Duration;

    use rodio::source::SineWave;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::AudioSink;
    use crate::error::{GameError, Result};

    /// Audio output through the default device
    pub struct RodioAudio {
        // Dropping the stream silences every sink, so it lives as long as we do
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
        effects: Sink,
    }

    impl RodioAudio {
        /// Open the default output device
        pub fn open() -> Result<Self> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| GameError::Audio(format!("Failed to create audio output stream: {}", e)))?;
            let effects = new_sink(&handle)?;
            Ok(Self {
                _stream: stream,
                handle,
                music: None,
                effects,
            })
        }

        fn decode(track: &Path) -> Result<Decoder<BufReader<File>>> {
            let file = File::open(track)
                .map_err(|e| GameError::Audio(format!("{}: {}", track.display(), e)))?;
            Decoder::new(BufReader::new(file))
                .map_err(|e| GameError::Audio(format!("{}: {}", track.display(), e)))
        }

        fn stop_music(&mut self) {
            if let Some(music) = self.music.take() {
                music.stop();
            }
        }
    }

    fn new_sink(handle: &OutputStreamHandle) -> Result<Sink> {
        Sink::try_new(handle).map_err(|e| GameError::Audio(format!("Failed to create audio sink: {}", e)))
    }

    impl AudioSink for RodioAudio {
        fn play_loop(&mut self, track: &Path) -> Result<()> {
            let source = Self::decode(track)?;
            self.stop_music();
            let sink = new_sink(&self.handle)?;
            sink.append(source.repeat_infinite());
            self.music = Some(sink);
            log::info!("Looping {}", track.display());
            Ok(())
        }

        fn play_to_completion(&mut self, track: &Path) -> Result<()> {
            let source = Self::decode(track)?;
            // One music channel: the new track replaces the loop
            self.stop_music();
            let sink = new_sink(&self.handle)?;
            sink.append(source);
            sink.sleep_until_end();
            Ok(())
        }

        fn beep(&mut self, frequency_hz: u32, duration: Duration) {
            let tone = SineWave::new(frequency_hz as f32)
                .take_duration(duration)
                .amplify(0.25);
            self.effects.append(tone);
        }

        fn stop(&mut self) {
            self.stop_music();
            self.effects.stop();
        }
    }
}
