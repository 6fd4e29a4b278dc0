//! Session state and the phase state machine

use std::fmt;
use std::time::Duration;

use crate::config::TimingConfig;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Players may move
    Green,
    /// Motion is evaluated and eliminates
    Red,
    /// Session is over; nothing else happens
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Green => write!(f, "green"),
            Phase::Red => write!(f, "red"),
            Phase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Current state of a game session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    /// Clock reading when the current phase began
    pub phase_started: Duration,
    pub eliminated: bool,
    /// Where the doll overlay is drawn
    pub doll_anchor: (i64, i64),
}

impl SessionState {
    /// Create a fresh GREEN state
    pub fn new(doll_anchor: (i64, i64), now: Duration) -> Self {
        Self {
            phase: Phase::Green,
            phase_started: now,
            eliminated: false,
            doll_anchor,
        }
    }

    /// Check whether the session has ended
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }
}

/// Whether a phase that began at `started` has run for at least `duration`
pub fn phase_expired(started: Duration, now: Duration, duration: Duration) -> bool {
    now.saturating_sub(started) >= duration
}

/// GREEN/RED alternation with a terminal state.
///
/// All mutations of the session go through here. Once the player is
/// eliminated the only reachable phase is `Terminated`.
#[derive(Debug, Clone)]
pub struct PhaseController {
    state: SessionState,
    green: Duration,
    red: Duration,
}

impl PhaseController {
    /// Start a session in GREEN at `now`
    pub fn new(timing: &TimingConfig, doll_anchor: (i64, i64), now: Duration) -> Self {
        Self {
            state: SessionState::new(doll_anchor, now),
            green: timing.green_duration(),
            red: timing.red_duration(),
        }
    }

    /// Get the full session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Get the current phase
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Check whether the elimination flag is raised
    pub fn is_eliminated(&self) -> bool {
        self.state.eliminated
    }

    /// Check whether the session has reached its terminal state
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    /// Configured length of `phase`; the terminal phase never expires
    pub fn duration_of(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Green => Some(self.green),
            Phase::Red => Some(self.red),
            Phase::Terminated => None,
        }
    }

    /// Whether the current phase has used up its duration
    pub fn is_expired(&self, now: Duration) -> bool {
        match self.duration_of(self.state.phase) {
            Some(duration) => phase_expired(self.state.phase_started, now, duration),
            None => false,
        }
    }

    /// Time left in the current phase
    pub fn remaining(&self, now: Duration) -> Duration {
        self.duration_of(self.state.phase)
            .map(|d| d.saturating_sub(now.saturating_sub(self.state.phase_started)))
            .unwrap_or_default()
    }

    /// End the current phase and enter the next one.
    ///
    /// GREEN goes to RED. RED goes back to GREEN unless the player was
    /// eliminated, in which case the session terminates.
    pub fn advance(&mut self, now: Duration) -> Phase {
        let next = match self.state.phase {
            _ if self.state.eliminated => Phase::Terminated,
            Phase::Green => Phase::Red,
            Phase::Red => Phase::Green,
            Phase::Terminated => Phase::Terminated,
        };
        if next != self.state.phase {
            log::info!("Phase {} -> {}", self.state.phase, next);
        }
        self.state.phase = next;
        self.state.phase_started = now;
        next
    }

    /// Advance if the current phase has expired. Returns the new phase when a
    /// transition happened.
    pub fn update(&mut self, now: Duration) -> Option<Phase> {
        if self.is_expired(now) {
            Some(self.advance(now))
        } else {
            None
        }
    }

    /// Record an elimination. Only possible while RED; returns whether the
    /// flag was newly raised.
    pub fn eliminate(&mut self) -> bool {
        if self.state.phase != Phase::Red || self.state.eliminated {
            return false;
        }
        self.state.eliminated = true;
        true
    }

    /// Jump straight to the terminal state (quit signal or teardown)
    pub fn terminate(&mut self, now: Duration) {
        if !self.state.is_terminated() {
            log::info!("Phase {} -> {}", self.state.phase, Phase::Terminated);
            self.state.phase = Phase::Terminated;
            self.state.phase_started = now;
        }
    }
}
