//! Pending action types
//!
//! Deferred side effects recorded durably while the device is offline and
//! replayed in FIFO order once connectivity returns.

use serde::{Deserialize, Serialize};

use crate::models::order::OrderItem;

/// Payload of a deferred inventory update
///
/// Immutable once constructed. Produced by the checkout flow, consumed by the
/// inventory reconciler and the order ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUpdatePayload {
    /// Client-side generated order ID
    pub order_id: String,
    pub items: Vec<OrderItem>,
    /// ISO-8601 timestamp
    pub timestamp: String,
    #[serde(default)]
    pub is_free_order: bool,
}

/// Kind of deferred action
///
/// A closed set: new side-effect kinds extend this enum rather than a
/// string-keyed dispatch table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingActionKind {
    InventoryUpdate(InventoryUpdatePayload),
}

/// One queued action, identified by its FIFO position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    #[serde(flatten)]
    pub kind: PendingActionKind,
    /// Enqueue time, epoch milliseconds
    pub enqueued_at: i64,
}

impl PendingAction {
    pub fn inventory_update(payload: InventoryUpdatePayload) -> Self {
        Self {
            kind: PendingActionKind::InventoryUpdate(payload),
            enqueued_at: crate::util::now_millis(),
        }
    }

    /// Order id the action belongs to, regardless of kind
    pub fn order_id(&self) -> &str {
        match &self.kind {
            PendingActionKind::InventoryUpdate(p) => &p.order_id,
        }
    }
}
