//! Degrading ledger writers
//!
//! Append-with-cap persistence for order history, system logs and free-item
//! records. All writers funnel through one generic write-with-degradation
//! routine: an ordered list of retention steps is attempted against the
//! record store, and the first step that fits the byte quota wins. Shrinking
//! the retained history trades depth for write availability, in a fixed,
//! deterministic order.
//!
//! Two eviction shapes exist:
//! - chronological cap cascades (orders `30 → 10 → 1`, logs `50 → 10 → 1`,
//!   free items `20 → 5 → 1`), every step keeping the newest record and
//!   dropping oldest first;
//! - targeted steps (used by the inventory reconciler) that narrow the
//!   persisted set to the records touched by one payload.
//!
//! When every step fails, one emergency measure remains: the lower-priority
//! `system-logs` collection is deleted and the final step retried once. Past
//! that the write fails with [`LedgerError::StorageExhausted`] and the caller
//! must surface it to the operator.

pub mod free_items;
pub mod logs;
pub mod orders;

pub use free_items::FreeItemLedger;
pub use logs::LogLedger;
pub use orders::OrderLedger;

use serde::Serialize;
use shared::models::LogEntry;
use thiserror::Error;

use crate::store::{RecordStore, StoreError, keys};

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage exhausted writing `{key}`: degrade cascade spent")]
    StorageExhausted { key: String },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// One attempt in a degrade cascade: the records to retain if this step wins
pub struct DegradeStep<T> {
    pub label: String,
    pub records: Vec<T>,
}

/// Build the chronological cascade for an append
///
/// Every step puts the new record first and keeps the largest feasible prefix
/// of the existing (newest-first) records under the step's cap.
pub fn chronological_steps<T: Clone>(
    new: T,
    existing: &[T],
    caps: &[usize],
) -> Vec<DegradeStep<T>> {
    caps.iter()
        .map(|&cap| {
            let mut records = Vec::with_capacity(cap.min(existing.len() + 1));
            records.push(new.clone());
            records.extend(existing.iter().take(cap.saturating_sub(1)).cloned());
            DegradeStep {
                label: format!("cap {cap}"),
                records,
            }
        })
        .collect()
}

/// Write `key` through an ordered degrade cascade
///
/// Attempts each step in order; quota failures fall through to the next
/// step, any other storage error propagates immediately. Returns the index
/// of the step that succeeded (0 = no degradation). Each degraded write
/// emits a best-effort log entry through `degrade_log` — pass `None` when
/// the failing ledger is the log ledger itself.
///
/// After the last step fails, the `system-logs` collection is deleted to
/// free space and the final step is retried once; if that also fails the
/// write is [`LedgerError::StorageExhausted`].
pub(crate) fn write_with_degradation<T: Serialize>(
    store: &RecordStore,
    key: &str,
    steps: Vec<DegradeStep<T>>,
    degrade_log: Option<&LogLedger>,
) -> LedgerResult<usize> {
    let total = steps.len();
    let mut last: Option<DegradeStep<T>> = None;

    for (idx, step) in steps.into_iter().enumerate() {
        match store.write_collection(key, &step.records) {
            Ok(()) => {
                if idx > 0 {
                    tracing::warn!(
                        key,
                        step = %step.label,
                        retained = step.records.len(),
                        "ledger write degraded"
                    );
                    if let Some(logs) = degrade_log {
                        logs.append_best_effort(LogEntry::new(
                            "ledger_degraded",
                            format!("{key}: retained {} records ({})", step.records.len(), step.label),
                        ));
                    }
                }
                return Ok(idx);
            }
            Err(e) if e.is_quota_exceeded() => {
                tracing::debug!(key, step = %step.label, "quota exceeded, degrading");
                last = Some(step);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let Some(step) = last else {
        return Err(LedgerError::StorageExhausted {
            key: key.to_string(),
        });
    };

    // Emergency measure: drop the lower-priority log collection, retry once.
    tracing::warn!(key, "degrade cascade spent, purging system logs");
    store.delete_collection(keys::SYSTEM_LOGS)?;

    match store.write_collection(key, &step.records) {
        Ok(()) => Ok(total),
        Err(e) if e.is_quota_exceeded() => Err(LedgerError::StorageExhausted {
            key: key.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
