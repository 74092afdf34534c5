//! Tumbller Shared Types
//!
//! This crate provides the per-device session state machine, the rover
//! command vocabulary and the frame meta-tag codec used by the frame server.

pub mod codec;
pub mod state_machine;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Session and adapter parameters for the system
pub mod session {
    /// Length of a paid control session in seconds
    pub const SESSION_DURATION_SECS: u64 = 300;

    /// Device adapter timeout (motor and camera requests)
    pub const DEVICE_TIMEOUT_MS: u64 = 10_000;

    /// Payment adapter timeout
    pub const PAYMENT_TIMEOUT_MS: u64 = 20_000;

    /// Annotated snapshots kept per device
    pub const SNAPSHOT_RETENTION: usize = 5;
}

/// Movement commands a frame button can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// Every direction in button order
    pub const ALL: [Direction; 5] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
        Direction::Stop,
    ];

    /// Name used in frame URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }

    /// Path segment understood by the rover firmware (`/motor/{command}`)
    pub fn motor_command(&self) -> &'static str {
        match self {
            Direction::Backward => "back",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a request names a direction outside the command vocabulary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid direction: {0}")]
pub struct InvalidDirection(pub String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| InvalidDirection(s.to_string()))
    }
}

/// Format a remaining duration as zero-padded `MM:SS`
pub fn format_time_left(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_maps_to_back() {
        assert_eq!(Direction::Backward.motor_command(), "back");
        assert_eq!(Direction::Forward.motor_command(), "forward");
        assert_eq!(Direction::Stop.motor_command(), "stop");
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("left".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("backward".parse::<Direction>(), Ok(Direction::Backward));

        // The firmware spelling is not a frame direction
        assert_eq!(
            "back".parse::<Direction>(),
            Err(InvalidDirection("back".into()))
        );
        assert!("FORWARD".parse::<Direction>().is_err());
    }

    #[test]
    fn test_format_time_left() {
        assert_eq!(format_time_left(Duration::ZERO), "00:00");
        assert_eq!(format_time_left(Duration::from_secs(50)), "00:50");
        assert_eq!(format_time_left(Duration::from_secs(300)), "05:00");
        assert_eq!(format_time_left(Duration::from_millis(61_900)), "01:01");
    }
}
