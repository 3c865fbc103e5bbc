//! Free item record ledger

use shared::models::FreeItemRecord;

use super::{LedgerResult, LogLedger, chronological_steps, write_with_degradation};
use crate::store::{RecordStore, StoreResult, keys};

/// Retention cap cascade for free item records
const FREE_ITEM_CAPS: [usize; 3] = [20, 5, 1];

#[derive(Clone)]
pub struct FreeItemLedger {
    store: RecordStore,
    logs: LogLedger,
}

impl FreeItemLedger {
    pub fn new(store: RecordStore, logs: LogLedger) -> Self {
        Self { store, logs }
    }

    /// Append a free item record through the degrade cascade
    pub fn append(&self, record: FreeItemRecord) -> LedgerResult<()> {
        let existing: Vec<FreeItemRecord> = self.store.read_collection(keys::FREE_ITEM_RECORDS)?;
        let steps = chronological_steps(record, &existing, &FREE_ITEM_CAPS);
        write_with_degradation(&self.store, keys::FREE_ITEM_RECORDS, steps, Some(&self.logs))?;
        Ok(())
    }

    /// All retained records, newest-first
    pub fn list(&self) -> StoreResult<Vec<FreeItemRecord>> {
        self.store.read_collection(keys::FREE_ITEM_RECORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::util;

    #[test]
    fn test_append_capped_at_twenty() {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let logs = LogLedger::new(store.clone());
        let ledger = FreeItemLedger::new(store, logs);

        for i in 0..25 {
            ledger
                .append(FreeItemRecord {
                    id: util::new_id(),
                    order_id: format!("o{i}"),
                    items: vec![],
                    reason: None,
                    timestamp: util::now_iso(),
                })
                .unwrap();
        }

        let records = ledger.list().unwrap();
        assert_eq!(records.len(), 20);
        assert_eq!(records[0].order_id, "o24");
    }
}
