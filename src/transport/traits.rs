//! Device adapter abstraction for pluggable rover backends

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Failures reported by a device adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// No response within the adapter timeout
    #[error("request timed out")]
    Timeout,

    /// Device answered with a non-2xx status
    #[error("device returned status {0}")]
    Status(u16),

    /// Connection refused, DNS failure, reset, ...
    #[error("transport failure: {0}")]
    Transport(String),
}

/// A single rover reachable over the local network
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    /// Send a motor command (`forward`, `back`, `left`, `right`, `stop`)
    async fn motor(&self, command: &str) -> Result<(), DeviceError>;

    /// Fetch a raw camera snapshot
    async fn snapshot(&self) -> Result<Bytes, DeviceError>;

    /// Human-readable name used in status messages
    fn name(&self) -> &str;
}
