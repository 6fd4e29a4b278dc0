//! Command-line entry point
//!
//! Plays a session from a directory of camera frames and writes the
//! composited frames to an output directory. Type `q` and Enter to quit.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use redlight::core::SystemClock;
use redlight::feedback::{AudioSink, FrameDumpDisplay, QuitSignal, SilentAudio};
use redlight::vision::{open_locator, FrameSequenceCamera};
use redlight::{Game, GameConfig, Overlays, SessionOutcome};

#[derive(Debug, Parser)]
#[command(name = "redlight", version, about = "Red light, green light with motion detection")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of camera frames to play
    #[arg(short, long)]
    frames: PathBuf,

    /// Directory the displayed frames are written to
    #[arg(short, long, default_value = "frames_out")]
    output: PathBuf,

    /// Asset root, overriding the configuration
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Restart the frame sequence when it runs out
    #[arg(long)]
    loop_frames: bool,

    /// Disable sound
    #[arg(long)]
    mute: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(SessionOutcome::Eliminated) => {
            log::info!("You died!");
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            log::info!("Game over: {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> redlight::Result<SessionOutcome> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(root) = args.assets {
        config.assets.root = root;
    }

    // Everything fatal happens before the first frame is shown
    let overlays = Overlays::load(&config.assets)?;
    let locator = if config.face.enabled {
        Some(open_locator(&config.face, &config.assets)?)
    } else {
        None
    };
    let camera = FrameSequenceCamera::from_directory(&args.frames, args.loop_frames)?;
    let audio = open_audio(args.mute)?;

    let quit = QuitSignal::new();
    watch_stdin(quit.clone());
    let display = FrameDumpDisplay::new(
        &args.output,
        config.display.window_width,
        config.display.window_height,
        quit,
    )?;

    let mut builder = Game::builder(config, overlays);
    if let Some(locator) = locator {
        builder = builder.face_locator(locator);
    }
    let mut game = builder.build(
        Box::new(camera),
        Box::new(display),
        audio,
        Box::new(SystemClock::new()),
    );
    game.run()
}

#[cfg(feature = "audio")]
fn open_audio(mute: bool) -> redlight::Result<Box<dyn AudioSink>> {
    if mute {
        return Ok(Box::new(SilentAudio));
    }
    Ok(Box::new(redlight::feedback::RodioAudio::open()?))
}

#[cfg(not(feature = "audio"))]
fn open_audio(_mute: bool) -> redlight::Result<Box<dyn AudioSink>> {
    log::info!("Built without audio support");
    Ok(Box::new(SilentAudio))
}

fn watch_stdin(quit: QuitSignal) {
    let spawned = std::thread::Builder::new()
        .name("quit-watcher".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                        quit.trigger();
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Quit key unavailable: {}", e);
    }
}
