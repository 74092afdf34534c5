//! Command relay to the rovers
//!
//! This module handles:
//! - Validating movement directions
//! - Forwarding motor and camera requests with a bounded timeout
//! - Turning adapter failures into user-facing status messages

mod relay;

pub use relay::{CaptureResult, CommandError, CommandRelay};

#[cfg(test)]
pub(crate) use relay::tests::{Behaviour, FakeDevice};
