//! Session management for paid rover control
//!
//! This module handles:
//! - One time-boxed access record per rover
//! - Lazy reclamation of expired sessions
//! - The validation gate and acquisition decision for frame requests

mod arbiter;
mod registry;

pub use arbiter::{Admission, Arbiter};
pub use registry::{AcquireOutcome, Recorded, SessionError, SessionRegistry};
