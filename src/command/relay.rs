//! Command relay - validates and forwards movement commands to rovers

use crate::transport::{DeviceAdapter, DeviceError};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tumbller_shared::{Direction, InvalidDirection};

/// Requests the relay rejects before contacting any adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    InvalidDirection(#[from] InvalidDirection),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

/// Outcome of a relayed command, reported in-band to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub success: bool,
    pub message: String,
}

/// Result of a camera capture
#[derive(Debug, Clone)]
pub enum CaptureResult {
    /// Raw image bytes from the camera
    Image(Bytes),
    /// Camera could not be read; message is user-facing
    Failed(RelayOutcome),
}

/// Forwards commands to the adapter registered for each device
pub struct CommandRelay {
    devices: HashMap<String, Arc<dyn DeviceAdapter>>,
    timeout: Duration,
}

impl CommandRelay {
    /// Create a relay whose adapter calls are bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            devices: HashMap::new(),
            timeout,
        }
    }

    /// Register the adapter for a device id
    pub fn register(&mut self, device_id: impl Into<String>, adapter: Arc<dyn DeviceAdapter>) {
        self.devices.insert(device_id.into(), adapter);
    }

    fn device(&self, device_id: &str) -> Result<&Arc<dyn DeviceAdapter>, CommandError> {
        self.devices
            .get(device_id)
            .ok_or_else(|| CommandError::UnknownDevice(device_id.to_string()))
    }

    /// Relay a movement command. Adapter failures come back as an
    /// unsuccessful outcome, never as an error.
    pub async fn relay(&self, device_id: &str, direction: &str) -> Result<RelayOutcome, CommandError> {
        let direction: Direction = direction.parse()?;
        let adapter = self.device(device_id)?;

        let start = Instant::now();
        let result = self
            .bounded(adapter.motor(direction.motor_command()))
            .await;
        let outcome = outcome_for(adapter.name(), result.map(|_| ()));

        if outcome.success {
            tracing::info!(
                device_id = %device_id,
                direction = %direction,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Command relayed"
            );
        } else {
            tracing::warn!(
                device_id = %device_id,
                direction = %direction,
                message = %outcome.message,
                "Command failed"
            );
        }

        Ok(outcome)
    }

    /// Fetch a camera snapshot for a device
    pub async fn capture(&self, device_id: &str) -> Result<CaptureResult, CommandError> {
        let adapter = self.device(device_id)?;

        match self.bounded(adapter.snapshot()).await {
            Ok(image) => {
                tracing::debug!(device_id = %device_id, size = image.len(), "Snapshot captured");
                Ok(CaptureResult::Image(image))
            }
            Err(e) => {
                let outcome = outcome_for(adapter.name(), Err(e));
                tracing::warn!(device_id = %device_id, message = %outcome.message, "Snapshot failed");
                Ok(CaptureResult::Failed(outcome))
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, DeviceError>
    where
        F: std::future::Future<Output = Result<T, DeviceError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout),
        }
    }
}

/// Translate an adapter result into the user-facing status
fn outcome_for(name: &str, result: Result<(), DeviceError>) -> RelayOutcome {
    match result {
        Ok(()) => RelayOutcome {
            success: true,
            message: "Command sent successfully".into(),
        },
        Err(DeviceError::Timeout) => RelayOutcome {
            success: false,
            message: format!("{} not responding", name),
        },
        Err(DeviceError::Status(status)) => RelayOutcome {
            success: false,
            message: format!("{} returned error: {}", name, status),
        },
        Err(DeviceError::Transport(_)) => RelayOutcome {
            success: false,
            message: format!("Unable to communicate with {}", name),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// How the fake rover answers
    #[derive(Debug, Clone)]
    pub(crate) enum Behaviour {
        Ok,
        Status(u16),
        Refused,
        Hang,
    }

    pub(crate) struct FakeDevice {
        name: String,
        behaviour: Behaviour,
        pub(crate) commands: Mutex<Vec<String>>,
    }

    impl FakeDevice {
        pub(crate) fn new(name: &str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                behaviour,
                commands: Mutex::new(Vec::new()),
            })
        }

        async fn answer(&self) -> Result<(), DeviceError> {
            match self.behaviour {
                Behaviour::Ok => Ok(()),
                Behaviour::Status(code) => Err(DeviceError::Status(code)),
                Behaviour::Refused => Err(DeviceError::Transport("connection refused".into())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    #[async_trait]
    impl DeviceAdapter for FakeDevice {
        async fn motor(&self, command: &str) -> Result<(), DeviceError> {
            self.commands.lock().unwrap().push(command.to_string());
            self.answer().await
        }

        async fn snapshot(&self) -> Result<Bytes, DeviceError> {
            self.answer().await?;
            Ok(Bytes::from_static(b"jpeg"))
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn relay_with(device: Arc<FakeDevice>) -> CommandRelay {
        let mut relay = CommandRelay::new(Duration::from_secs(10));
        relay.register("A", device);
        relay
    }

    #[tokio::test]
    async fn test_backward_is_sent_as_back() {
        let device = FakeDevice::new("Rover A", Behaviour::Ok);
        let relay = relay_with(device.clone());

        let outcome = relay.relay("A", "backward").await.unwrap();
        assert_eq!(
            outcome,
            RelayOutcome {
                success: true,
                message: "Command sent successfully".into()
            }
        );
        assert_eq!(*device.commands.lock().unwrap(), vec!["back".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_direction_never_reaches_adapter() {
        let device = FakeDevice::new("Rover A", Behaviour::Ok);
        let relay = relay_with(device.clone());

        let result = relay.relay("A", "jump").await;
        assert_eq!(
            result,
            Err(CommandError::InvalidDirection(InvalidDirection("jump".into())))
        );
        assert!(device.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Ok));
        assert_eq!(
            relay.relay("Z", "stop").await,
            Err(CommandError::UnknownDevice("Z".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported_in_band() {
        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Hang));

        let started = tokio::time::Instant::now();
        let outcome = relay.relay("A", "forward").await.unwrap();

        assert_eq!(outcome.message, "Rover A not responding");
        assert!(!outcome.success);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test]
    async fn test_status_and_transport_failures() {
        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Status(503)));
        let outcome = relay.relay("A", "left").await.unwrap();
        assert_eq!(outcome.message, "Rover A returned error: 503");
        assert!(!outcome.success);

        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Refused));
        let outcome = relay.relay("A", "right").await.unwrap();
        assert_eq!(outcome.message, "Unable to communicate with Rover A");
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_capture() {
        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Ok));
        assert!(matches!(
            relay.capture("A").await.unwrap(),
            CaptureResult::Image(ref b) if b.as_ref() == b"jpeg"
        ));

        let relay = relay_with(FakeDevice::new("Rover A", Behaviour::Status(404)));
        match relay.capture("A").await.unwrap() {
            CaptureResult::Failed(outcome) => {
                assert_eq!(outcome.message, "Rover A returned error: 404")
            }
            CaptureResult::Image(_) => panic!("expected failure"),
        }
    }
}
