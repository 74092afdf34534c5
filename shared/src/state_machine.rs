//! Device Session State Machine
//!
//! Defines the access states of a single rover and the transitions between
//! them. Time never drives a stored transition: `HeldExpired` is derived from
//! the holder's acquisition instant at read time.

use crate::format_time_left;
use std::time::{Duration, Instant};

/// Access state of a device at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody holds the device
    Unheld,
    /// A holder exists and its window has not run out
    HeldActive,
    /// A holder is still recorded but its window has run out
    HeldExpired,
}

/// The paying party currently holding a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    /// Payment transaction id
    pub token: String,
    /// Payer account id (advisory)
    pub user: String,
    pub acquired_at: Instant,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A payment completed for this device
    Acquired { token: String, user: String },
    /// Session ended (explicit release or reclaim after expiry)
    Cleared,
}

/// Result of processing an event
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    /// Event applied, device is now in the given state
    Success(SessionState),
    /// An acquisition overwrote a holder whose window was still open
    Evicted { previous: Holder },
}

/// Access-control record for one device
#[derive(Debug, Clone)]
pub struct DeviceSession {
    holder: Option<Holder>,
    duration: Duration,
}

impl DeviceSession {
    /// Create an unheld session record
    pub fn new(duration: Duration) -> Self {
        Self {
            holder: None,
            duration,
        }
    }

    pub fn holder(&self) -> Option<&Holder> {
        self.holder.as_ref()
    }

    /// Time since the current holder acquired the device
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.holder
            .as_ref()
            .map(|h| now.saturating_duration_since(h.acquired_at))
    }

    /// Derive the state at `now`
    pub fn state(&self, now: Instant) -> SessionState {
        match self.elapsed(now) {
            None => SessionState::Unheld,
            // Still valid at exactly the boundary
            Some(elapsed) if elapsed > self.duration => SessionState::HeldExpired,
            Some(_) => SessionState::HeldActive,
        }
    }

    /// True when the device can be acquired (unheld or expired)
    pub fn is_available(&self, now: Instant) -> bool {
        self.state(now) != SessionState::HeldActive
    }

    /// Remaining window, floored at zero
    pub fn time_left(&self, now: Instant) -> Duration {
        match self.elapsed(now) {
            None => Duration::ZERO,
            Some(elapsed) => self.duration.saturating_sub(elapsed),
        }
    }

    /// Remaining window as `MM:SS`
    pub fn time_left_label(&self, now: Instant) -> String {
        format_time_left(self.time_left(now))
    }

    /// Apply an event at `now`
    ///
    /// Acquisition overwrites unconditionally; callers that must not evict a
    /// live holder check `is_available` first.
    pub fn process_event(&mut self, event: SessionEvent, now: Instant) -> TransitionResult {
        match event {
            SessionEvent::Acquired { token, user } => {
                let was_active = self.state(now) == SessionState::HeldActive;
                let previous = self.holder.replace(Holder {
                    token,
                    user,
                    acquired_at: now,
                });

                match previous {
                    Some(previous) if was_active => TransitionResult::Evicted { previous },
                    _ => TransitionResult::Success(SessionState::HeldActive),
                }
            }
            SessionEvent::Cleared => {
                self.holder = None;
                TransitionResult::Success(SessionState::Unheld)
            }
        }
    }
}

/// Check if a transition from one state to another is valid
pub fn is_valid_transition(from: SessionState, to: SessionState) -> bool {
    use SessionState::*;

    match (from, to) {
        (a, b) if a == b => true,
        (Unheld, HeldActive) => true,
        (HeldActive, HeldExpired) => true,
        (HeldActive, Unheld) => true,
        (HeldExpired, Unheld) => true,
        // Reclaiming an expired session always passes through Unheld
        (HeldExpired, HeldActive) => false,
        _ => false,
    }
}
