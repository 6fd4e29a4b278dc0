//! Events emitted by a game session

use super::state::Phase;
use crate::vision::MotionRegion;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Motion was caught during RED
    Eliminated,
    /// The player asked to quit
    Quit,
    /// The camera stopped producing frames
    CameraClosed,
}

/// Something observable happened during a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A GREEN or RED phase began
    PhaseStarted { phase: Phase, at_ms: u128 },
    /// Qualifying motion regions were found on a RED tick
    MotionDetected { regions: Vec<MotionRegion> },
    /// The elimination flag was raised
    Eliminated { regions: usize },
    /// A camera read failed and the phase was cut short
    CameraFailure { phase: Phase, message: String },
    /// The session reached its terminal state
    SessionEnded { outcome: SessionOutcome },
}

/// Callback type for session events
pub type EventCallback = Box<dyn Fn(&SessionEvent)>;

/// Event handler that can have multiple listeners
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a listener
    pub fn subscribe(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Emit an event to all listeners
    pub fn emit(&self, event: SessionEvent) {
        for callback in &self.callbacks {
            callback(&event);
        }
    }

    /// Check if there are any listeners
    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
