//! Core game abstractions
//!
//! This module contains the main types for a session:
//! - `PhaseController` - GREEN/RED state machine with the terminal state
//! - `Game` - runner that drives phases, detection and feedback
//! - `SessionEvent` - events emitted while a session plays
//! - `Clock` - injectable monotonic time

mod clock;
mod events;
mod runner;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventCallback, EventHandler, SessionEvent, SessionOutcome};
pub use runner::{Game, GameBuilder};
pub use state::{phase_expired, Phase, PhaseController, SessionState};
