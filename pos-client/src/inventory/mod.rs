//! Inventory reconciliation
//!
//! Applies a completed order's quantity decrements across the curated and
//! user-added catalogs, clamping stock at zero. Inventory correctness is
//! best-effort relative to order completion: the public [`apply`] entry point
//! never fails the caller, while queue replay uses the fallible
//! [`try_apply`] so a storage failure aborts the replay instead of silently
//! dropping an action.
//!
//! Reapplying the same payload twice double-decrements; duplication is
//! bounded by the pending queue's replay-then-clear semantics, not by
//! payload-level deduplication.
//!
//! [`apply`]: InventoryReconciler::apply
//! [`try_apply`]: InventoryReconciler::try_apply

use std::collections::{HashMap, HashSet};

use shared::models::{Catalog, LogEntry, ProductStock};
use shared::pending::InventoryUpdatePayload;
use thiserror::Error;

use crate::ledger::{DegradeStep, LedgerError, LogLedger, write_with_degradation};
use crate::store::{RecordStore, StoreError, keys};

/// Stock level assumed for a product that has never been counted
const DEFAULT_STOCK: i64 = 100;

/// Reconciliation errors (internal; only queue replay propagates them)
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Clone)]
pub struct InventoryReconciler {
    store: RecordStore,
    logs: LogLedger,
}

impl InventoryReconciler {
    pub fn new(store: RecordStore, logs: LogLedger) -> Self {
        Self { store, logs }
    }

    /// Apply a payload's decrements, containing every failure
    ///
    /// Errors are logged and swallowed: a degraded stock subsystem never
    /// blocks completing a sale.
    pub fn apply(&self, payload: &InventoryUpdatePayload) {
        if let Err(e) = self.try_apply(payload) {
            tracing::error!(order_id = %payload.order_id, error = %e, "inventory reconciliation failed");
            self.logs.append_best_effort(LogEntry::new(
                "reconciliation_failed",
                format!("order {}: {e}", payload.order_id),
            ));
        }
    }

    /// Apply a payload's decrements, propagating storage failures
    pub fn try_apply(&self, payload: &InventoryUpdatePayload) -> Result<(), ReconcileError> {
        let mut curated: Vec<ProductStock> = self.store.read_collection(keys::STOCK_CURATED)?;
        let mut custom: Vec<ProductStock> = self.store.read_collection(keys::STOCK_CUSTOM)?;

        // Union lookup over both catalogs. A cross-catalog id collision is
        // resolved deterministically in favor of the curated entry.
        let mut index: HashMap<String, (Catalog, usize)> = HashMap::new();
        for (i, p) in curated.iter().enumerate() {
            index.insert(p.id.clone(), (Catalog::Curated, i));
        }
        for (i, p) in custom.iter().enumerate() {
            if index.contains_key(&p.id) {
                tracing::warn!(
                    product_id = %p.id,
                    "product id present in both catalogs, curated entry wins"
                );
                continue;
            }
            index.insert(p.id.clone(), (Catalog::UserAdded, i));
        }

        let mut touched: HashSet<String> = HashSet::new();
        for item in &payload.items {
            let Some(&(catalog, idx)) = index.get(&item.product_id) else {
                // No negative creation: unknown products are skipped.
                tracing::warn!(
                    product_id = %item.product_id,
                    order_id = %payload.order_id,
                    "product not found in stock, decrement skipped"
                );
                self.logs.append_best_effort(LogEntry::new(
                    "reconciliation_skipped",
                    format!(
                        "product {} not found for order {}",
                        item.product_id, payload.order_id
                    ),
                ));
                continue;
            };

            let stock = match catalog {
                Catalog::Curated => &mut curated[idx],
                Catalog::UserAdded => &mut custom[idx],
            };
            let current = stock.quantity.unwrap_or(DEFAULT_STOCK);
            stock.quantity = Some((current - item.quantity).max(0));
            touched.insert(item.product_id.clone());
        }

        self.persist_catalog(keys::STOCK_CURATED, curated, &touched)?;
        self.persist_catalog(keys::STOCK_CUSTOM, custom, &touched)?;
        Ok(())
    }

    /// Persist one catalog through targeted degradation
    ///
    /// Unlike the chronological ledgers, quota pressure here narrows the
    /// persisted set to the products touched by this payload rather than to
    /// an arbitrary cap.
    fn persist_catalog(
        &self,
        key: &str,
        records: Vec<ProductStock>,
        touched: &HashSet<String>,
    ) -> Result<(), LedgerError> {
        let touched_only: Vec<ProductStock> = records
            .iter()
            .filter(|p| touched.contains(&p.id))
            .cloned()
            .collect();
        let steps = vec![
            DegradeStep {
                label: "full catalog".to_string(),
                records,
            },
            DegradeStep {
                label: "touched products only".to_string(),
                records: touched_only,
            },
        ];
        write_with_degradation(&self.store, key, steps, Some(&self.logs))?;
        Ok(())
    }
}
