//! HTTP device adapter for the rover firmware and its snapshot camera

use crate::transport::traits::{DeviceAdapter, DeviceError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

/// Endpoints of one rover
#[derive(Debug, Clone)]
pub struct DeviceEndpoint {
    pub device_id: String,
    pub name: String,
    /// Motor controller base, e.g. `http://tumbller-a.local`
    pub base_url: String,
    /// Snapshot camera base, e.g. `http://tumbller-a-cam.local`
    pub camera_url: String,
}

/// Talks to a rover with plain GET requests
pub struct HttpDeviceAdapter {
    endpoint: DeviceEndpoint,
    client: Client,
}

impl HttpDeviceAdapter {
    /// Create an adapter whose requests are bounded by `timeout`
    pub fn new(endpoint: DeviceEndpoint, timeout: Duration) -> Result<Self, DeviceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeviceError::Transport(e.to_string()))?;

        Ok(Self { endpoint, client })
    }

    fn motor_url(&self, command: &str) -> String {
        format!("{}/motor/{}", self.endpoint.base_url.trim_end_matches('/'), command)
    }

    fn image_url(&self) -> String {
        format!("{}/getImage", self.endpoint.camera_url.trim_end_matches('/'))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, DeviceError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeviceError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

fn classify(e: reqwest::Error) -> DeviceError {
    if e.is_timeout() {
        DeviceError::Timeout
    } else {
        DeviceError::Transport(e.to_string())
    }
}

#[async_trait]
impl DeviceAdapter for HttpDeviceAdapter {
    async fn motor(&self, command: &str) -> Result<(), DeviceError> {
        let url = self.motor_url(command);
        tracing::debug!(device_id = %self.endpoint.device_id, url = %url, "Sending motor command");
        self.get(&url).await?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Bytes, DeviceError> {
        let url = self.image_url();
        let response = self.get(&url).await?;
        response.bytes().await.map_err(classify)
    }

    fn name(&self) -> &str {
        &self.endpoint.name
    }
}
