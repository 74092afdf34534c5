//! Camera snapshots with a time-left overlay

mod overlay;
mod store;

pub use overlay::annotate;
pub use store::SnapshotStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
