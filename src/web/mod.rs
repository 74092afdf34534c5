//! Frame server HTTP surface
//!
//! - Device selection and the acquisition decision
//! - Payment request and callback handling
//! - Rover controls and camera snapshots behind the session gate
//! - JSON status and transaction log

mod render;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
