// Sled-backed transaction log.
use super::{sort_records, StoreError, TransactionRecord, TransactionStore};
use sled::{Config, Tree};
use std::path::Path;

const TRANSACTIONS_TREE: &str = "transactions";

#[derive(Clone)]
pub struct SledTransactionStore {
    tree: Tree,
}

impl SledTransactionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Config::default().path(path).open()?;
        let tree = db.open_tree(TRANSACTIONS_TREE)?;
        Ok(Self { tree })
    }
}

impl TransactionStore for SledTransactionStore {
    fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(record)?;

        // Insert only if the key is absent
        let swapped = self.tree.compare_and_swap(
            record.transaction_id.as_bytes(),
            None as Option<&[u8]>,
            Some(bytes),
        )?;
        if swapped.is_err() {
            return Err(StoreError::Duplicate(record.transaction_id.clone()));
        }

        self.tree.flush()?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut records = self
            .tree
            .iter()
            .values()
            .map(|value| Ok(serde_json::from_slice(value?.as_ref())?))
            .collect::<Result<Vec<TransactionRecord>, StoreError>>()?;

        sort_records(&mut records);
        Ok(records)
    }
}
