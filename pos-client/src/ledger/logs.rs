//! System log ledger
//!
//! Application-level audit trail, distinct from diagnostic tracing. Lowest
//! priority of the three ledgers: under storage exhaustion this is the
//! collection the others sacrifice.

use shared::models::LogEntry;

use super::{LedgerError, LedgerResult, chronological_steps, write_with_degradation};
use crate::store::{RecordStore, StoreResult, keys};

/// Retention cap cascade for system logs
const LOG_CAPS: [usize; 3] = [50, 10, 1];

#[derive(Clone)]
pub struct LogLedger {
    store: RecordStore,
}

impl LogLedger {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Append a log entry through the degrade cascade
    ///
    /// Degradation of the log ledger itself is not logged (logging is what
    /// is failing at that point).
    pub fn append(&self, entry: LogEntry) -> LedgerResult<()> {
        let existing: Vec<LogEntry> = self.store.read_collection(keys::SYSTEM_LOGS)?;
        let steps = chronological_steps(entry, &existing, &LOG_CAPS);
        write_with_degradation(&self.store, keys::SYSTEM_LOGS, steps, None)?;
        Ok(())
    }

    /// Append, swallowing any failure
    ///
    /// Used wherever a log write must never block the primary transaction.
    pub fn append_best_effort(&self, entry: LogEntry) {
        if let Err(e) = self.append(entry) {
            match e {
                LedgerError::StorageExhausted { .. } => {
                    tracing::warn!("log entry dropped: storage exhausted");
                }
                other => tracing::warn!(error = %other, "log entry dropped"),
            }
        }
    }

    /// All retained entries, newest-first
    pub fn list(&self) -> StoreResult<Vec<LogEntry>> {
        self.store.read_collection(keys::SYSTEM_LOGS)
    }
}
