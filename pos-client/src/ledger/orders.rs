//! Order history ledger

use shared::models::{Order, OrderStatus, SyncStatus};

use super::{LedgerResult, LogLedger, chronological_steps, write_with_degradation};
use crate::store::{RecordStore, StoreResult, keys};

/// Retention cap cascade for order history
const ORDER_CAPS: [usize; 3] = [30, 10, 1];

#[derive(Clone)]
pub struct OrderLedger {
    store: RecordStore,
    logs: LogLedger,
}

impl OrderLedger {
    pub fn new(store: RecordStore, logs: LogLedger) -> Self {
        Self { store, logs }
    }

    /// Append a completed order through the degrade cascade
    ///
    /// The new order is always retained; only the oldest history entries are
    /// sacrificed under quota pressure.
    pub fn append(&self, order: Order) -> LedgerResult<()> {
        let existing: Vec<Order> = self.store.read_collection(keys::ORDER_HISTORY)?;
        let steps = chronological_steps(order, &existing, &ORDER_CAPS);
        write_with_degradation(&self.store, keys::ORDER_HISTORY, steps, Some(&self.logs))?;
        Ok(())
    }

    /// All retained orders, newest-first
    pub fn list(&self) -> StoreResult<Vec<Order>> {
        self.store.read_collection(keys::ORDER_HISTORY)
    }

    /// Update an order's status in place
    ///
    /// Returns whether the order was found. No cap cascade: the rewrite does
    /// not grow the history.
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> LedgerResult<bool> {
        self.update(order_id, |order| order.status = status)
    }

    /// Flip an order's sync status to `Synced` after a successful replay
    pub fn mark_synced(&self, order_id: &str) -> LedgerResult<bool> {
        self.update(order_id, |order| order.sync_status = SyncStatus::Synced)
    }

    fn update(&self, order_id: &str, apply: impl FnOnce(&mut Order)) -> LedgerResult<bool> {
        let mut orders: Vec<Order> = self.store.read_collection(keys::ORDER_HISTORY)?;
        let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(false);
        };
        apply(order);
        self.store.write_collection(keys::ORDER_HISTORY, &orders)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderItem;
    use shared::util;

    fn ledgers() -> (OrderLedger, RecordStore) {
        let store = RecordStore::open_in_memory(1024 * 1024).unwrap();
        let logs = LogLedger::new(store.clone());
        (OrderLedger::new(store.clone(), logs), store)
    }

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                name: "Latte".to_string(),
                price: 4.0,
                quantity: 2,
                category: "drinks".to_string(),
                image: None,
            }],
            total: 8.0,
            timestamp: util::now_iso(),
            status: OrderStatus::Completed,
            sync_status: SyncStatus::Pending,
            is_free_order: false,
        }
    }

    #[test]
    fn test_append_newest_first_capped() {
        let (ledger, _store) = ledgers();
        for i in 0..35 {
            ledger.append(order(&format!("o{i}"))).unwrap();
        }
        let orders = ledger.list().unwrap();
        assert_eq!(orders.len(), 30);
        assert_eq!(orders[0].id, "o34");
    }

    #[test]
    fn test_mark_synced() {
        let (ledger, _store) = ledgers();
        ledger.append(order("o1")).unwrap();

        assert!(ledger.mark_synced("o1").unwrap());
        assert!(!ledger.mark_synced("missing").unwrap());

        let orders = ledger.list().unwrap();
        assert_eq!(orders[0].sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_update_status() {
        let (ledger, _store) = ledgers();
        ledger.append(order("o1")).unwrap();

        assert!(ledger.update_status("o1", OrderStatus::Canceled).unwrap());
        assert_eq!(ledger.list().unwrap()[0].status, OrderStatus::Canceled);
    }
}
