//! Pending action queue
//!
//! Durable FIFO of deferred side-effecting actions created while offline.
//! The in-memory list is mirrored wholesale to the `pending-actions`
//! collection on every mutation (the list is small and replay infrequent)
//! and reloaded at construction, so queued actions survive a restart.
//!
//! Replay is all-or-nothing: actions apply sequentially in enqueue order and
//! the first failure aborts the whole pass, leaving the entire queue —
//! including the already-applied prefix — intact for the next attempt. This
//! is at-least-once, never silent loss; duplication on retry is the accepted
//! trade.
//!
//! The queue never schedules its own replay: the host triggers it on an
//! observed transition to effective-online with a non-empty queue.

use parking_lot::Mutex;

use shared::pending::{InventoryUpdatePayload, PendingAction, PendingActionKind};

use crate::inventory::{InventoryReconciler, ReconcileError};
use crate::ledger::OrderLedger;
use crate::store::{RecordStore, StoreResult, keys};

pub struct PendingQueue {
    store: RecordStore,
    actions: Mutex<Vec<PendingAction>>,
}

impl PendingQueue {
    /// Load the queue from the store, restoring any actions left over from a
    /// previous run
    pub fn load(store: RecordStore) -> StoreResult<Self> {
        let actions: Vec<PendingAction> = store.read_collection(keys::PENDING_ACTIONS)?;
        if !actions.is_empty() {
            tracing::info!(count = actions.len(), "restored pending actions from storage");
        }
        Ok(Self {
            store,
            actions: Mutex::new(actions),
        })
    }

    /// Append an action and mirror the whole list to storage
    ///
    /// If the durable write fails the in-memory list is rolled back so
    /// memory and storage never disagree.
    pub fn enqueue(&self, action: PendingAction) -> StoreResult<()> {
        let mut actions = self.actions.lock();
        actions.push(action);
        if let Err(e) = self.store.write_collection(keys::PENDING_ACTIONS, &actions) {
            actions.pop();
            return Err(e);
        }
        tracing::info!(count = actions.len(), "pending action enqueued");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }

    /// Snapshot of the queued actions, FIFO order
    pub fn actions(&self) -> Vec<PendingAction> {
        self.actions.lock().clone()
    }

    /// Empty the queue in memory and storage
    ///
    /// Storage first: if the durable clear fails the in-memory list is kept
    /// so the next replay still sees every action.
    pub fn clear(&self) -> StoreResult<()> {
        let mut actions = self.actions.lock();
        self.store.delete_collection(keys::PENDING_ACTIONS)?;
        actions.clear();
        Ok(())
    }

    /// Replay every queued action through the reconciler, in enqueue order
    ///
    /// Returns `true` when the whole queue applied and was cleared. On full
    /// success each replayed order's sync status is patched to `Synced`
    /// (best-effort — the inventory effect, not the badge, is the
    /// integrity-bearing part).
    pub fn replay(&self, reconciler: &InventoryReconciler, orders: &OrderLedger) -> bool {
        self.replay_with(orders, |payload| reconciler.try_apply(payload))
    }

    fn replay_with(
        &self,
        orders: &OrderLedger,
        mut apply: impl FnMut(&InventoryUpdatePayload) -> Result<(), ReconcileError>,
    ) -> bool {
        let snapshot = self.actions();
        if snapshot.is_empty() {
            return true;
        }
        tracing::info!(count = snapshot.len(), "replaying pending actions");

        // Sequential, ordered: later actions may touch stock already
        // adjusted by earlier ones.
        for (position, action) in snapshot.iter().enumerate() {
            let result = match &action.kind {
                PendingActionKind::InventoryUpdate(payload) => apply(payload),
            };
            if let Err(e) = result {
                tracing::warn!(
                    position,
                    order_id = %action.order_id(),
                    error = %e,
                    "replay aborted, queue preserved"
                );
                return false;
            }
        }

        for action in &snapshot {
            match orders.mark_synced(action.order_id()) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(order_id = %action.order_id(), "no order record to mark synced");
                }
                Err(e) => {
                    tracing::warn!(order_id = %action.order_id(), error = %e, "failed to mark order synced");
                }
            }
        }

        match self.clear() {
            Ok(()) => {
                tracing::info!(count = snapshot.len(), "pending actions replayed and cleared");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to clear pending queue after replay");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LogLedger;
    use shared::models::{Order, OrderItem, OrderStatus, SyncStatus};
    use shared::util;

    fn item(product_id: &str, quantity: i64) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            name: format!("product {product_id}"),
            price: 2.0,
            quantity,
            category: "general".to_string(),
            image: None,
        }
    }

    fn payload(order_id: &str, items: Vec<OrderItem>) -> InventoryUpdatePayload {
        InventoryUpdatePayload {
            order_id: order_id.to_string(),
            items,
            timestamp: util::now_iso(),
            is_free_order: false,
        }
    }

    fn order_ledger(store: &RecordStore) -> OrderLedger {
        OrderLedger::new(store.clone(), LogLedger::new(store.clone()))
    }

    #[test]
    fn test_enqueue_survives_reload() {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let queue = PendingQueue::load(store.clone()).unwrap();
        queue
            .enqueue(PendingAction::inventory_update(payload("o1", vec![item("p1", 2)])))
            .unwrap();
        queue
            .enqueue(PendingAction::inventory_update(payload("o2", vec![item("p1", 1)])))
            .unwrap();

        // Fresh queue over the same store sees both actions, in order.
        let reloaded = PendingQueue::load(store).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.actions()[0].order_id(), "o1");
        assert_eq!(reloaded.actions()[1].order_id(), "o2");
    }

    #[test]
    fn test_replay_aborts_midway_preserving_whole_queue() {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let queue = PendingQueue::load(store.clone()).unwrap();
        for id in ["o1", "o2", "o3"] {
            queue
                .enqueue(PendingAction::inventory_update(payload(id, vec![item("p1", 1)])))
                .unwrap();
        }

        let orders = order_ledger(&store);
        let mut applied = Vec::new();
        let ok = queue.replay_with(&orders, |p| {
            if p.order_id == "o2" {
                return Err(ReconcileError::Ledger(
                    crate::ledger::LedgerError::StorageExhausted {
                        key: keys::STOCK_CURATED.to_string(),
                    },
                ));
            }
            applied.push(p.order_id.clone());
            Ok(())
        });

        assert!(!ok);
        assert_eq!(applied, vec!["o1"]);
        // The applied-but-unflushed prefix stays queued too.
        assert_eq!(queue.len(), 3);
        let persisted: Vec<PendingAction> = store.read_collection(keys::PENDING_ACTIONS).unwrap();
        assert_eq!(persisted.len(), 3);
        assert_eq!(persisted[0].order_id(), "o1");
        assert_eq!(persisted[2].order_id(), "o3");
    }

    #[test]
    fn test_replay_success_clears_and_marks_synced() {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let orders = order_ledger(&store);
        orders
            .append(Order {
                id: "o1".to_string(),
                items: vec![item("p1", 1)],
                total: 2.0,
                timestamp: util::now_iso(),
                status: OrderStatus::Completed,
                sync_status: SyncStatus::Pending,
                is_free_order: false,
            })
            .unwrap();

        let queue = PendingQueue::load(store.clone()).unwrap();
        queue
            .enqueue(PendingAction::inventory_update(payload("o1", vec![item("p1", 1)])))
            .unwrap();

        let ok = queue.replay_with(&orders, |_| Ok(()));
        assert!(ok);
        assert!(queue.is_empty());
        let persisted: Vec<PendingAction> = store.read_collection(keys::PENDING_ACTIONS).unwrap();
        assert!(persisted.is_empty());
        assert_eq!(orders.list().unwrap()[0].sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_replay_applies_in_enqueue_order() {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let queue = PendingQueue::load(store.clone()).unwrap();
        for id in ["a", "b", "c"] {
            queue
                .enqueue(PendingAction::inventory_update(payload(id, vec![item("p1", 1)])))
                .unwrap();
        }

        let orders = order_ledger(&store);
        let mut seen = Vec::new();
        assert!(queue.replay_with(&orders, |p| {
            seen.push(p.order_id.clone());
            Ok(())
        }));
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
