use super::{sort_records, StoreError, TransactionRecord, TransactionStore};
use std::sync::Mutex;

/// Process-local log, used when no database path is configured and in tests
#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: Mutex<Vec<TransactionRecord>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records
            .iter()
            .any(|r| r.transaction_id == record.transaction_id)
        {
            return Err(StoreError::Duplicate(record.transaction_id.clone()));
        }
        records.push(record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        sort_records(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let store = InMemoryTransactionStore::new();
        store.insert(&TransactionRecord::new("0x1", "42", "A")).unwrap();

        assert!(matches!(
            store.insert(&TransactionRecord::new("0x1", "42", "A")),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
