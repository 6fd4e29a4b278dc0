//! Main game runner
//!
//! One sequential loop drives everything: camera reads, motion detection,
//! compositing and display. The only waits are the per-frame quit poll and
//! the elimination sound plus pause at the end.

use std::time::Duration;

use image::{Rgb, RgbImage};

use super::clock::Clock;
use super::events::{EventCallback, EventHandler, SessionEvent, SessionOutcome};
use super::state::{Phase, PhaseController};
use crate::assets::Overlays;
use crate::config::GameConfig;
use crate::error::Result;
use crate::feedback::{AudioSink, DisplaySink};
use crate::vision::compositor::{composite, composite_centered, draw_banner, draw_border};
use crate::vision::detector::draw_contours;
use crate::vision::{CameraSource, FaceHighlighter, FaceLocator, MotionDetector, SkinToneLocator};

const SAFE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const DANGER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CONTOUR_THICKNESS: u32 = 2;

/// Why a phase loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEnd {
    Elapsed,
    CameraFailure,
    Quit,
    Eliminated,
}

/// A single game session and every collaborator it owns.
///
/// Camera, display and audio are released when the game is dropped, on every
/// exit path.
pub struct Game {
    config: GameConfig,
    overlays: Overlays,
    detector: MotionDetector,
    highlighter: FaceHighlighter,
    camera: Box<dyn CameraSource>,
    display: Box<dyn DisplaySink>,
    audio: Box<dyn AudioSink>,
    clock: Box<dyn Clock>,
    controller: PhaseController,
    events: EventHandler,
    audio_stopped: bool,
}

impl Game {
    /// Start building a game from its configuration and loaded overlays
    pub fn builder(config: GameConfig, overlays: Overlays) -> GameBuilder {
        GameBuilder::new(config, overlays)
    }

    /// Get the configuration the game was built with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get the current phase
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Check whether the player has been caught moving
    pub fn is_eliminated(&self) -> bool {
        self.controller.is_eliminated()
    }

    /// Register a listener for session events
    pub fn on_event(&mut self, callback: EventCallback) {
        self.events.subscribe(callback);
    }

    /// Play the session until elimination, quit, or camera loss.
    ///
    /// Each call is a fresh session with its own music and teardown.
    pub fn run(&mut self) -> Result<SessionOutcome> {
        let music = self.config.assets.resolve(&self.config.audio.background_music);
        self.audio.play_loop(&music)?;
        self.audio_stopped = false;

        let now = self.clock.now();
        self.controller = PhaseController::new(&self.config.timing, self.config.display.doll_anchor, now);
        log::info!(
            "Game started: green {:?}, red {:?}, min area {}",
            self.config.timing.green_duration(),
            self.config.timing.red_duration(),
            self.config.detection.min_contour_area
        );

        let outcome = loop {
            if !self.camera.is_opened() {
                log::info!("Camera closed, ending session");
                self.controller.terminate(self.clock.now());
                break SessionOutcome::CameraClosed;
            }

            let phase = self.controller.phase();
            self.events.emit(SessionEvent::PhaseStarted {
                phase,
                at_ms: self.clock.now().as_millis(),
            });

            let end = match phase {
                Phase::Green => self.green_phase(),
                Phase::Red => self.red_phase(),
                Phase::Terminated => break SessionOutcome::Eliminated,
            };

            match end {
                PhaseEnd::Eliminated => {
                    self.finish_elimination();
                    self.controller.advance(self.clock.now());
                    break SessionOutcome::Eliminated;
                }
                PhaseEnd::Quit => {
                    log::info!("Quit requested");
                    self.controller.terminate(self.clock.now());
                    break SessionOutcome::Quit;
                }
                PhaseEnd::Elapsed | PhaseEnd::CameraFailure => {
                    self.controller.advance(self.clock.now());
                }
            }
        };

        self.events.emit(SessionEvent::SessionEnded { outcome });
        self.shutdown();
        log::info!("Session ended: {:?}", outcome);
        Ok(outcome)
    }

    fn green_phase(&mut self) -> PhaseEnd {
        while !self.controller.is_expired(self.clock.now()) {
            let mut frame = match self.camera.read() {
                Ok(frame) => frame,
                Err(e) => return self.camera_failure(e),
            };

            let (x, y) = self.controller.state().doll_anchor;
            composite(&mut frame, &self.overlays.doll_back, x, y);
            draw_border(&mut frame, SAFE_COLOR, self.config.display.border_thickness);
            self.present(&frame);

            if self.display.poll_quit(self.config.timing.frame_wait()) {
                return PhaseEnd::Quit;
            }
        }
        PhaseEnd::Elapsed
    }

    fn red_phase(&mut self) -> PhaseEnd {
        while !self.controller.is_expired(self.clock.now()) && !self.controller.is_eliminated() {
            let first = self.camera.read();
            let second = self.camera.read();
            let (mut frame, next) = match (first, second) {
                (Ok(a), Ok(b)) => (a, b),
                (Err(e), _) | (_, Err(e)) => return self.camera_failure(e),
            };

            let quit = self.red_tick(&mut frame, &next);
            if self.controller.is_eliminated() {
                return PhaseEnd::Eliminated;
            }
            if quit {
                return PhaseEnd::Quit;
            }
        }
        PhaseEnd::Elapsed
    }

    /// One RED evaluation over a frame pair. Returns whether quit was requested.
    fn red_tick(&mut self, frame: &mut RgbImage, next: &RgbImage) -> bool {
        let analysis = self.detector.analyze(frame, next);
        draw_contours(frame, &analysis.contours, DANGER_COLOR, CONTOUR_THICKNESS);

        if analysis.has_motion() {
            for region in &analysis.regions {
                let (cx, cy) = region.center();
                composite_centered(frame, &self.overlays.impact, cx, cy);
                draw_banner(
                    frame,
                    self.config.display.banner_y,
                    self.config.display.banner_height,
                    DANGER_COLOR,
                );
                self.audio.beep(
                    self.config.audio.beep_frequency_hz,
                    Duration::from_millis(self.config.audio.beep_duration_ms),
                );
                self.controller.eliminate();
            }
            log::info!("Motion caught: {} region(s)", analysis.regions.len());
            self.events.emit(SessionEvent::MotionDetected {
                regions: analysis.regions.clone(),
            });
            self.events.emit(SessionEvent::Eliminated {
                regions: analysis.regions.len(),
            });
        }

        // Decorative glow is drawn regardless of the outcome; the doll goes on
        // last so the locator never sees its face.
        self.highlighter.highlight(frame);
        let (x, y) = self.controller.state().doll_anchor;
        composite(frame, &self.overlays.doll_front, x, y);
        draw_border(frame, DANGER_COLOR, self.config.display.border_thickness);
        self.present(frame);

        self.display.poll_quit(self.config.timing.frame_wait())
    }

    fn camera_failure(&mut self, error: crate::error::GameError) -> PhaseEnd {
        let phase = self.controller.phase();
        log::warn!("{} (ending {} phase early)", error, phase);
        self.events.emit(SessionEvent::CameraFailure {
            phase,
            message: error.to_string(),
        });
        PhaseEnd::CameraFailure
    }

    fn present(&mut self, frame: &RgbImage) {
        if let Err(e) = self.display.show(frame) {
            log::warn!("{}", e);
        }
    }

    /// Elimination sound to completion, then a short pause
    fn finish_elimination(&mut self) {
        let track = self.config.assets.resolve(&self.config.audio.elimination_sound);
        if let Err(e) = self.audio.play_to_completion(&track) {
            log::warn!("{}", e);
        }
        self.clock.sleep(self.config.timing.elimination_pause());
    }

    fn shutdown(&mut self) {
        if !self.audio_stopped {
            self.audio.stop();
            self.audio_stopped = true;
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for [`Game`]
pub struct GameBuilder {
    config: GameConfig,
    overlays: Overlays,
    locator: Option<Box<dyn FaceLocator>>,
    callbacks: Vec<EventCallback>,
}

impl GameBuilder {
    /// Create a new builder
    pub fn new(config: GameConfig, overlays: Overlays) -> Self {
        Self {
            config,
            overlays,
            locator: None,
            callbacks: Vec::new(),
        }
    }

    /// Set the face locator, usually the one from [`crate::vision::open_locator`].
    /// Without one the game falls back to the skin-tone heuristic.
    pub fn face_locator(mut self, locator: Box<dyn FaceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Register a session event listener
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SessionEvent) + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Hand over the collaborators. The game owns them from here on.
    pub fn build(
        self,
        camera: Box<dyn CameraSource>,
        display: Box<dyn DisplaySink>,
        audio: Box<dyn AudioSink>,
        clock: Box<dyn Clock>,
    ) -> Game {
        let locator = self.locator.unwrap_or_else(|| {
            log::debug!("No face locator given, using the skin-tone fallback");
            Box::new(SkinToneLocator::new(self.config.face.min_face_size))
        });
        let mut events = EventHandler::new();
        for callback in self.callbacks {
            events.subscribe(callback);
        }
        let controller = PhaseController::new(&self.config.timing, self.config.display.doll_anchor, clock.now());

        Game {
            detector: MotionDetector::new(self.config.detection.clone()),
            highlighter: FaceHighlighter::new(locator, self.config.face.clone()),
            overlays: self.overlays,
            camera,
            display,
            audio,
            clock,
            controller,
            events,
            audio_stopped: false,
            config: self.config,
        }
    }
}
