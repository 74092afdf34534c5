//! Session registry for tracking who controls each rover

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tumbller_shared::state_machine::{
    DeviceSession, SessionEvent, SessionState, TransitionResult,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Whether the payment log saw a transaction for the first time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    New,
    Existing,
}

/// Outcome of an atomic record-check-acquire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// A new session was opened for the caller
    Acquired,
    /// The same transaction already holds the device
    AlreadyHeld,
    /// Another holder's window is still open
    Occupied { time_left: String },
    /// The transaction was recorded before and holds nothing now
    Spent,
}

/// Read-only view of one device, for status reporting
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub device_id: String,
    pub available: bool,
    pub holder_user: Option<String>,
    pub time_left: String,
}

/// Owns one guarded session record per known device.
///
/// The device table is fixed at construction; each entry has its own lock so
/// traffic on one rover never waits on another.
pub struct SessionRegistry {
    cells: HashMap<String, Mutex<DeviceSession>>,
    duration: Duration,
}

/// Current instant on the tokio clock (pausable in tests)
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl SessionRegistry {
    /// Create a registry with every device unheld
    pub fn new<I, S>(device_ids: I, duration: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = device_ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                let session = DeviceSession::new(duration);
                (id, Mutex::new(session))
            })
            .collect();

        Self { cells, duration }
    }

    /// Known device ids, sorted
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cells.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.cells.contains_key(device_id)
    }

    fn cell(&self, device_id: &str) -> Result<&Mutex<DeviceSession>> {
        self.cells
            .get(device_id)
            .ok_or_else(|| SessionError::UnknownDevice(device_id.to_string()))
    }

    /// True when nobody holds the device or the holder's window ran out.
    ///
    /// Pure query: an expired holder stays recorded until reclaimed.
    pub async fn is_available(&self, device_id: &str) -> Result<bool> {
        let session = self.cell(device_id)?.lock().await;
        Ok(session.is_available(now()))
    }

    /// Open a fresh window for `transaction_id`, overwriting any holder.
    ///
    /// Callers are expected to have checked availability; use
    /// [`SessionRegistry::try_acquire`] to record, check and start atomically.
    pub async fn start_session(&self, device_id: &str, transaction_id: &str, user: &str) -> Result<()> {
        let mut session = self.cell(device_id)?.lock().await;
        let result = session.process_event(
            SessionEvent::Acquired {
                token: transaction_id.to_string(),
                user: user.to_string(),
            },
            now(),
        );

        match result {
            TransitionResult::Evicted { previous } => {
                tracing::warn!(
                    device_id = %device_id,
                    evicted_transaction = %previous.token,
                    evicted_user = %previous.user,
                    transaction_id = %transaction_id,
                    "Session started over a live holder"
                );
            }
            TransitionResult::Success(_) => {
                tracing::info!(
                    device_id = %device_id,
                    transaction_id = %transaction_id,
                    user = %user,
                    duration_secs = self.duration.as_secs(),
                    "Session started"
                );
            }
        }
        Ok(())
    }

    /// Remaining window as `MM:SS`, `00:00` when unheld or expired
    pub async fn get_time_left(&self, device_id: &str) -> Result<String> {
        let session = self.cell(device_id)?.lock().await;
        Ok(session.time_left_label(now()))
    }

    /// Return the device to the unheld state. Idempotent.
    pub async fn clear_session(&self, device_id: &str) -> Result<()> {
        let mut session = self.cell(device_id)?.lock().await;
        if let Some(holder) = session.holder() {
            tracing::info!(
                device_id = %device_id,
                transaction_id = %holder.token,
                "Session cleared"
            );
        }
        session.process_event(SessionEvent::Cleared, now());
        Ok(())
    }

    /// Clear the device if it is available and report whether a live
    /// session remains.
    pub async fn reclaim(&self, device_id: &str) -> Result<bool> {
        let mut session = self.cell(device_id)?.lock().await;
        let now = now();

        match session.state(now) {
            SessionState::HeldActive => Ok(true),
            SessionState::HeldExpired => {
                if let Some(holder) = session.holder() {
                    tracing::info!(
                        device_id = %device_id,
                        transaction_id = %holder.token,
                        "Expired session reclaimed"
                    );
                }
                session.process_event(SessionEvent::Cleared, now);
                Ok(false)
            }
            SessionState::Unheld => {
                session.process_event(SessionEvent::Cleared, now);
                Ok(false)
            }
        }
    }

    /// Record a payment and acquire the device in one step under its lock.
    ///
    /// `record` runs while the device guard is held, so a repeated delivery
    /// of the same transaction waits for the first one and then finds it
    /// holding the device. Two payers for one free device cannot both win:
    /// the second observes `Occupied`. A recording failure is handed back
    /// untouched and leaves the session as it was.
    pub async fn try_acquire<F, Fut, E>(
        &self,
        device_id: &str,
        transaction_id: &str,
        user: &str,
        record: F,
    ) -> Result<std::result::Result<AcquireOutcome, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Recorded, E>>,
    {
        let mut session = self.cell(device_id)?.lock().await;
        let recorded = match record().await {
            Ok(recorded) => recorded,
            Err(e) => return Ok(Err(e)),
        };
        let now = now();

        let available = session.is_available(now);
        let same_holder = session
            .holder()
            .is_some_and(|h| h.token == transaction_id);
        if !available && same_holder {
            return Ok(Ok(AcquireOutcome::AlreadyHeld));
        }

        if recorded == Recorded::Existing {
            tracing::warn!(
                device_id = %device_id,
                transaction_id = %transaction_id,
                "Transaction already spent"
            );
            return Ok(Ok(AcquireOutcome::Spent));
        }

        if !available {
            let time_left = session.time_left_label(now);
            tracing::info!(
                device_id = %device_id,
                transaction_id = %transaction_id,
                time_left = %time_left,
                "Acquisition refused, device occupied"
            );
            return Ok(Ok(AcquireOutcome::Occupied { time_left }));
        }

        session.process_event(
            SessionEvent::Acquired {
                token: transaction_id.to_string(),
                user: user.to_string(),
            },
            now,
        );
        tracing::info!(
            device_id = %device_id,
            transaction_id = %transaction_id,
            user = %user,
            duration_secs = self.duration.as_secs(),
            "Session acquired"
        );
        Ok(Ok(AcquireOutcome::Acquired))
    }

    /// Status of every device, sorted by id
    pub async fn snapshot(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::with_capacity(self.cells.len());
        for device_id in self.device_ids() {
            let Some(cell) = self.cells.get(&device_id) else {
                continue;
            };
            let session = cell.lock().await;
            let now = now();
            let available = session.is_available(now);

            summaries.push(SessionSummary {
                device_id,
                available,
                holder_user: session
                    .holder()
                    .filter(|_| !available)
                    .map(|h| h.user.clone()),
                time_left: session.time_left_label(now),
            });
        }
        summaries
    }
}
