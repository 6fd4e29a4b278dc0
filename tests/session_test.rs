//! End-to-end sessions driven by synthetic frames and a manual clock

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use redlight::core::{Clock, ManualClock};
use redlight::feedback::{AudioSink, DisplaySink};
use redlight::vision::CameraSource;
use redlight::{Game, GameConfig, GameError, Overlays, Phase, SessionEvent, SessionOutcome};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const TICK: Duration = Duration::from_millis(100);

/// Camera that plays a script of frames; `None` entries are read failures.
/// Once the script runs out it repeats `fallback`, or closes if there is none.
struct ScriptedCamera {
    script: VecDeque<Option<RgbImage>>,
    fallback: Option<RgbImage>,
    opened: bool,
}

impl ScriptedCamera {
    fn new(script: Vec<Option<RgbImage>>, fallback: Option<RgbImage>) -> Self {
        Self {
            script: script.into(),
            fallback,
            opened: true,
        }
    }
}

impl CameraSource for ScriptedCamera {
    fn is_opened(&self) -> bool {
        self.opened
    }

    fn read(&mut self) -> redlight::Result<RgbImage> {
        match self.script.pop_front() {
            Some(Some(frame)) => Ok(frame),
            Some(None) => Err(GameError::Capture("scripted failure".to_string())),
            None => match &self.fallback {
                Some(frame) => Ok(frame.clone()),
                None => {
                    self.opened = false;
                    Err(GameError::Capture("end of script".to_string()))
                }
            },
        }
    }
}

/// Display that keeps every frame and moves the clock forward on each poll
struct RecordingDisplay {
    shown: Rc<RefCell<Vec<RgbImage>>>,
    clock: ManualClock,
    polls: usize,
    quit_after: Option<usize>,
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, frame: &RgbImage) -> redlight::Result<()> {
        self.shown.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn poll_quit(&mut self, _timeout: Duration) -> bool {
        self.clock.advance(TICK);
        self.polls += 1;
        self.quit_after.map_or(false, |n| self.polls >= n)
    }
}

#[derive(Clone, Default)]
struct RecordingAudio {
    calls: Rc<RefCell<Vec<String>>>,
}

impl AudioSink for RecordingAudio {
    fn play_loop(&mut self, track: &Path) -> redlight::Result<()> {
        self.calls.borrow_mut().push(format!("loop {}", track.display()));
        Ok(())
    }

    fn play_to_completion(&mut self, track: &Path) -> redlight::Result<()> {
        self.calls.borrow_mut().push(format!("play {}", track.display()));
        Ok(())
    }

    fn beep(&mut self, frequency_hz: u32, duration: Duration) {
        self.calls
            .borrow_mut()
            .push(format!("beep {} {}", frequency_hz, duration.as_millis()));
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push("stop".to_string());
    }
}

struct Harness {
    game: Game,
    clock: ManualClock,
    shown: Rc<RefCell<Vec<RgbImage>>>,
    audio: RecordingAudio,
    events: Rc<RefCell<Vec<SessionEvent>>>,
}

fn config(green_ms: u64, red_ms: u64) -> GameConfig {
    GameConfig::default()
        .with_durations(Duration::from_millis(green_ms), Duration::from_millis(red_ms))
        .with_asset_root("assets")
}

fn overlays() -> Overlays {
    Overlays {
        impact: RgbaImage::from_pixel(12, 12, Rgba([10, 10, 10, 255])),
        doll_front: RgbaImage::from_pixel(20, 20, Rgba([200, 0, 200, 255])),
        doll_back: RgbaImage::from_pixel(20, 20, Rgba([0, 0, 200, 255])),
    }
}

fn harness(config: GameConfig, camera: ScriptedCamera, quit_after: Option<usize>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let clock = ManualClock::new();
    let shown = Rc::new(RefCell::new(Vec::new()));
    let audio = RecordingAudio::default();
    let events = Rc::new(RefCell::new(Vec::new()));

    let sink = events.clone();
    let game = Game::builder(config, overlays())
        .on_event(move |event| sink.borrow_mut().push(event.clone()))
        .build(
            Box::new(camera),
            Box::new(RecordingDisplay {
                shown: shown.clone(),
                clock: clock.clone(),
                polls: 0,
                quit_after,
            }),
            Box::new(audio.clone()),
            Box::new(clock.clone()),
        );

    Harness {
        game,
        clock,
        shown,
        audio,
        events,
    }
}

fn black() -> RgbImage {
    RgbImage::new(WIDTH, HEIGHT)
}

fn with_block(x: u32, y: u32, size: u32) -> RgbImage {
    let mut frame = black();
    for py in y..y + size {
        for px in x..x + size {
            frame.put_pixel(px, py, Rgb([255, 255, 255]));
        }
    }
    frame
}

fn phases_started(events: &[SessionEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::PhaseStarted { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

#[test]
fn test_block_motion_eliminates_on_first_red_tick() {
    // 10 green ticks, then a red pair differing by a 100x100 white block
    let mut script: Vec<Option<RgbImage>> = (0..10).map(|_| Some(black())).collect();
    script.push(Some(black()));
    script.push(Some(with_block(110, 70, 100)));
    let camera = ScriptedCamera::new(script, Some(black()));

    let mut h = harness(config(1000, 1000), camera, None);
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::Eliminated);
    assert!(h.game.is_eliminated());
    assert_eq!(h.game.phase(), Phase::Terminated);

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red]);

    let regions: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MotionDetected { regions } => Some(regions.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].len(), 1);
    let area = regions[0][0].area;
    assert!(area >= 10_000.0 && area < 13_000.0, "area {}", area);
    assert!(events.contains(&SessionEvent::SessionEnded {
        outcome: SessionOutcome::Eliminated
    }));

    // Exactly one red tick was displayed after the ten green ones
    let shown = h.shown.borrow();
    assert_eq!(shown.len(), 11);
    assert_eq!(*shown[0].get_pixel(0, 0), Rgb([0, 255, 0]));
    assert_eq!(*shown[10].get_pixel(0, 0), Rgb([255, 0, 0]));
    // Doll back during green, doll front during red, both at the anchor
    assert_eq!(*shown[0].get_pixel(17, 60), Rgb([0, 0, 200]));
    assert_eq!(*shown[10].get_pixel(17, 60), Rgb([200, 0, 200]));

    let calls = h.audio.calls.borrow();
    assert_eq!(
        *calls,
        vec![
            format!("loop {}", Path::new("assets").join("audio/background.mp3").display()),
            "beep 1000 200".to_string(),
            format!("play {}", Path::new("assets").join("audio/gun.mp3").display()),
            "stop".to_string(),
        ]
    );

    // Red tick poll plus the post-elimination pause
    assert_eq!(h.clock.now(), Duration::from_millis(1000 + 100 + 2000));
}

#[test]
fn test_still_frames_loop_back_to_green() {
    // 5 green ticks, 5 red ticks of two reads, 1 more green tick, then the camera closes
    let script: Vec<Option<RgbImage>> = (0..16).map(|_| Some(black())).collect();
    let camera = ScriptedCamera::new(script, None);

    let mut h = harness(config(500, 500), camera, None);
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::CameraClosed);
    assert!(!h.game.is_eliminated());
    assert_eq!(h.game.phase(), Phase::Terminated);

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red, Phase::Green]);
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::MotionDetected { .. })));
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::Eliminated { .. })));
    assert_eq!(h.shown.borrow().len(), 11);

    let calls = h.audio.calls.borrow();
    assert!(!calls.iter().any(|c| c.starts_with("beep") || c.starts_with("play")));
    assert_eq!(calls.last().map(String::as_str), Some("stop"));
}

#[test]
fn test_camera_failure_ends_red_phase_early() {
    let mut script: Vec<Option<RgbImage>> = (0..5).map(|_| Some(black())).collect();
    script.push(Some(black()));
    script.push(None);
    let camera = ScriptedCamera::new(script, Some(black()));

    let mut h = harness(config(500, 5000), camera, Some(8));
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::Quit);
    assert!(!h.game.is_eliminated());

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red, Phase::Green]);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::CameraFailure { phase: Phase::Red, .. })));

    // No red frame was ever displayed: 5 green ticks, then 3 more before quitting
    let shown = h.shown.borrow();
    assert_eq!(shown.len(), 8);
    assert!(shown.iter().all(|f| *f.get_pixel(0, 0) == Rgb([0, 255, 0])));
}

#[test]
fn test_quit_during_green_terminates() {
    let camera = ScriptedCamera::new(Vec::new(), Some(black()));

    let mut h = harness(config(5000, 5000), camera, Some(3));
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::Quit);
    assert_eq!(h.game.phase(), Phase::Terminated);
    assert_eq!(phases_started(&h.events.borrow()), vec![Phase::Green]);
    assert_eq!(h.shown.borrow().len(), 3);
}

#[test]
fn test_small_motion_does_not_eliminate() {
    // Red ticks alternate still and a 30x30 flicker, well under the area floor
    let mut script: Vec<Option<RgbImage>> = (0..5).map(|_| Some(black())).collect();
    for _ in 0..5 {
        script.push(Some(black()));
        script.push(Some(with_block(50, 50, 30)));
    }
    let camera = ScriptedCamera::new(script, None);

    let mut h = harness(config(500, 500), camera, None);
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::CameraClosed);
    assert!(!h.game.is_eliminated());
    assert!(!h
        .events
        .borrow()
        .iter()
        .any(|e| matches!(e, SessionEvent::Eliminated { .. })));

    // The sub-threshold change is still outlined on the red frames
    let shown = h.shown.borrow();
    let red_frame = &shown[5];
    let outlined = (30..100u32)
        .flat_map(|y| (30..100u32).map(move |x| (x, y)))
        .any(|(x, y)| *red_frame.get_pixel(x, y) == Rgb([255, 0, 0]));
    assert!(outlined);
    assert_eq!(*red_frame.get_pixel(160, 120), Rgb([0, 0, 0]));
}

#[test]
fn test_audio_released_once_on_drop() {
    let camera = ScriptedCamera::new(Vec::new(), Some(black()));
    let h = harness(config(500, 500), camera, None);
    let calls = h.audio.calls.clone();

    drop(h);
    assert_eq!(*calls.borrow(), vec!["stop".to_string()]);
}

#[test]
fn test_audio_released_once_after_run() {
    let camera = ScriptedCamera::new(Vec::new(), Some(black()));
    let mut h = harness(config(500, 500), camera, Some(1));
    h.game.run().unwrap();

    let calls = h.audio.calls.clone();
    drop(h);
    let stops = calls.borrow().iter().filter(|c| *c == "stop").count();
    assert_eq!(stops, 1);
}

#[test]
fn test_camera_failure_ends_green_phase_early() {
    // Third green read fails, red runs its full 500 ms on still frames,
    // then the script runs dry and the camera closes
    let mut script: Vec<Option<RgbImage>> = vec![Some(black()), Some(black()), None];
    script.extend((0..10).map(|_| Some(black())));
    let camera = ScriptedCamera::new(script, None);

    let mut h = harness(config(500, 500), camera, None);
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::CameraClosed);
    assert!(!h.game.is_eliminated());

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red, Phase::Green]);
    assert!(matches!(
        events.iter().find(|e| matches!(e, SessionEvent::CameraFailure { .. })),
        Some(SessionEvent::CameraFailure { phase: Phase::Green, .. })
    ));
    // Red began as soon as green gave up, not at the 500 ms mark
    assert!(events.contains(&SessionEvent::PhaseStarted {
        phase: Phase::Red,
        at_ms: 200
    }));

    let shown = h.shown.borrow();
    assert_eq!(shown.len(), 2 + 5);
    assert_eq!(*shown[1].get_pixel(0, 0), Rgb([0, 255, 0]));
    assert_eq!(*shown[2].get_pixel(0, 0), Rgb([255, 0, 0]));

    let calls = h.audio.calls.borrow();
    assert!(!calls.iter().any(|c| c.starts_with("play")));
    assert_eq!(calls.last().map(String::as_str), Some("stop"));
}

#[test]
fn test_quit_during_red_terminates() {
    // 5 green polls, then quit on the second red poll
    let camera = ScriptedCamera::new(Vec::new(), Some(black()));

    let mut h = harness(config(500, 5000), camera, Some(7));
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::Quit);
    assert_eq!(h.game.phase(), Phase::Terminated);
    assert!(!h.game.is_eliminated());

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red]);
    assert!(events.contains(&SessionEvent::SessionEnded {
        outcome: SessionOutcome::Quit
    }));

    let shown = h.shown.borrow();
    assert_eq!(shown.len(), 7);
    assert_eq!(*shown[6].get_pixel(0, 0), Rgb([255, 0, 0]));

    assert_eq!(
        *h.audio.calls.borrow(),
        vec![
            format!("loop {}", Path::new("assets").join("audio/background.mp3").display()),
            "stop".to_string(),
        ]
    );
    // Quitting skips the elimination pause
    assert_eq!(h.clock.now(), Duration::from_millis(700));
}

#[test]
fn test_elimination_wins_over_quit_on_same_tick() {
    let mut script: Vec<Option<RgbImage>> = (0..10).map(|_| Some(black())).collect();
    script.push(Some(black()));
    script.push(Some(with_block(110, 70, 100)));
    let camera = ScriptedCamera::new(script, Some(black()));

    // The 11th poll is the first red tick, the same one that sees the block
    let mut h = harness(config(1000, 1000), camera, Some(11));
    let outcome = h.game.run().unwrap();

    assert_eq!(outcome, SessionOutcome::Eliminated);
    assert!(h.game.is_eliminated());
    assert_eq!(h.game.phase(), Phase::Terminated);

    let events = h.events.borrow();
    assert_eq!(phases_started(&events), vec![Phase::Green, Phase::Red]);
    assert!(events.contains(&SessionEvent::SessionEnded {
        outcome: SessionOutcome::Eliminated
    }));

    let calls = h.audio.calls.borrow();
    let gun = format!("play {}", Path::new("assets").join("audio/gun.mp3").display());
    assert!(calls.contains(&gun), "calls {:?}", *calls);
    assert_eq!(calls.last().map(String::as_str), Some("stop"));
    assert_eq!(h.clock.now(), Duration::from_millis(1000 + 100 + 2000));
}

#[test]
fn test_second_run_restarts_and_stops_music() {
    let camera = ScriptedCamera::new(Vec::new(), Some(black()));
    let mut h = harness(config(500, 500), camera, Some(1));

    assert_eq!(h.game.run().unwrap(), SessionOutcome::Quit);
    assert_eq!(h.game.run().unwrap(), SessionOutcome::Quit);

    let music = format!("loop {}", Path::new("assets").join("audio/background.mp3").display());
    let calls = h.audio.calls.clone();
    drop(h);
    assert_eq!(
        *calls.borrow(),
        vec![music.clone(), "stop".to_string(), music, "stop".to_string()]
    );
}
