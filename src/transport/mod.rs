pub mod http;
pub mod traits;

#[cfg(test)]
pub(crate) mod canned;

pub use http::{DeviceEndpoint, HttpDeviceAdapter};
pub use traits::{DeviceAdapter, DeviceError};
