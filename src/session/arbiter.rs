//! Arbitration: the gate in front of every protected frame action

use super::registry::{Result, SessionRegistry};
use std::sync::Arc;

/// What a caller selecting a device should be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Device is free; start the payment flow
    Available,
    /// Someone else holds the device
    Wait { time_left: String },
}

/// Decides access for inbound requests against the registry
#[derive(Clone)]
pub struct Arbiter {
    registry: Arc<SessionRegistry>,
}

impl Arbiter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// True only while the device has a live session.
    ///
    /// An expired session is reclaimed as a side effect, so `false` covers
    /// both "never held" and "just expired". Unknown ids are `false`.
    pub async fn validate_session(&self, device_id: &str) -> bool {
        match self.registry.reclaim(device_id).await {
            Ok(live) => live,
            Err(e) => {
                tracing::debug!(device_id = %device_id, error = %e, "Session validation failed");
                false
            }
        }
    }

    /// Acquisition decision for a device selection
    pub async fn admission(&self, device_id: &str) -> Result<Admission> {
        if self.registry.is_available(device_id).await? {
            Ok(Admission::Available)
        } else {
            let time_left = self.registry.get_time_left(device_id).await?;
            Ok(Admission::Wait { time_left })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionError;
    use std::time::Duration;
    use tokio::time::advance;

    fn arbiter() -> Arbiter {
        Arbiter::new(Arc::new(SessionRegistry::new(
            ["A", "B"],
            Duration::from_secs(300),
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_session() {
        let arbiter = arbiter();

        assert!(!arbiter.validate_session("Z").await);
        assert!(!arbiter.validate_session("A").await);

        arbiter.registry().start_session("A", "tx1", "42").await.unwrap();
        assert!(arbiter.validate_session("A").await);
        assert!(!arbiter.validate_session("B").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_reclaimed_once() {
        let arbiter = arbiter();
        arbiter.registry().start_session("A", "tx1", "42").await.unwrap();

        advance(Duration::from_secs(301)).await;
        assert!(!arbiter.validate_session("A").await);
        // Second call after the reclaim is still false and harmless
        assert!(!arbiter.validate_session("A").await);
        assert!(arbiter.registry().is_available("A").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rover_a_scenario() {
        let arbiter = arbiter();
        let registry = arbiter.registry().clone();

        registry.start_session("A", "tx1", "42").await.unwrap();

        advance(Duration::from_secs(250)).await;
        assert!(arbiter.validate_session("A").await);
        assert_eq!(registry.get_time_left("A").await.unwrap(), "00:50");

        advance(Duration::from_secs(51)).await;
        assert!(!arbiter.validate_session("A").await);
        assert!(registry.is_available("A").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission() {
        let arbiter = arbiter();
        assert_eq!(arbiter.admission("A").await.unwrap(), Admission::Available);

        arbiter.registry().start_session("A", "tx1", "42").await.unwrap();
        advance(Duration::from_secs(30)).await;
        assert_eq!(
            arbiter.admission("A").await.unwrap(),
            Admission::Wait {
                time_left: "04:30".into()
            }
        );

        assert_eq!(
            arbiter.admission("Z").await,
            Err(SessionError::UnknownDevice("Z".into()))
        );
    }
}
