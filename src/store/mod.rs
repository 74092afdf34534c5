//! Append-only transaction log
//!
//! One record per successful payment callback, keyed by the processor's
//! transaction id.

mod in_memory;
mod sled_storage;

pub use in_memory::InMemoryTransactionStore;
pub use sled_storage::SledTransactionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub user: String,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(transaction_id: &str, user: &str, device_id: &str) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            user: user.to_string(),
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction {0} already recorded")]
    Duplicate(String),

    #[error("storage error: {0}")]
    Backend(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait TransactionStore: Send + Sync {
    /// Record a transaction; fails with `Duplicate` if the id exists
    fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    /// Every record, oldest first
    fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError>;
}

fn sort_records(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
}
