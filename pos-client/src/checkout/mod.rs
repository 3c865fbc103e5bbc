//! Checkout state machine
//!
//! Orchestrates a single order's lifecycle: `Initial → Processing →
//! {Success | Failed}` on the online path, with a parallel `Offline` state
//! entered whenever effective connectivity is not online at dialog open.
//! Each session is created from a fresh connectivity read with a freshly
//! generated order id; nothing carries over between checkouts.

pub mod backend;

pub use backend::{OrderAck, OrderBackend, SimulatedBackend};

use std::sync::Arc;

use shared::models::{FreeItemRecord, LogEntry, Order, OrderItem, OrderStatus, SyncStatus};
use shared::pending::{InventoryUpdatePayload, PendingAction};
use shared::util;
use thiserror::Error;

use crate::connectivity::ConnectivityMonitor;
use crate::inventory::InventoryReconciler;
use crate::ledger::{FreeItemLedger, LedgerError, LogLedger, OrderLedger};
use crate::pending::PendingQueue;
use crate::store::StoreError;

/// Lifecycle state of one checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Initial,
    /// Backend call in flight; the dialog cannot be dismissed
    Processing,
    /// Effective connectivity was not online at session start
    Offline,
    Success,
    Failed,
}

/// Checkout errors surfaced to the operator
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Checkout rejected: {message}")]
    Rejected { message: String },

    #[error("Storage exhausted: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Operation not allowed in state {state:?}")]
    InvalidState { state: CheckoutState },
}

/// One checkout dialog's state
///
/// Created by [`CheckoutFlow::begin`]; holds no references into the flow so
/// the host can keep it across await points freely.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    order_id: String,
    state: CheckoutState,
    completed: bool,
    message: Option<String>,
}

impl CheckoutSession {
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Short localized status message for the operator, when one exists
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Processing is the only non-dismissable state
    pub fn can_dismiss(&self) -> bool {
        self.state != CheckoutState::Processing
    }

    /// Dismiss the dialog
    ///
    /// Returns whether the host should run its checkout-complete path (cart
    /// clear, product reload): true after a completed online or offline
    /// checkout, false after a failure or an unconfirmed dialog.
    pub fn dismiss(&self) -> Result<bool, CheckoutError> {
        if !self.can_dismiss() {
            return Err(CheckoutError::InvalidState { state: self.state });
        }
        Ok(self.completed)
    }
}

/// Checkout orchestrator
///
/// Reads the connectivity mode once per submit decision, then drives the
/// reconciler, ledgers and pending queue.
pub struct CheckoutFlow {
    monitor: Arc<ConnectivityMonitor>,
    queue: Arc<PendingQueue>,
    reconciler: InventoryReconciler,
    orders: OrderLedger,
    free_items: FreeItemLedger,
    logs: LogLedger,
    backend: Arc<dyn OrderBackend>,
}

impl CheckoutFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        monitor: Arc<ConnectivityMonitor>,
        queue: Arc<PendingQueue>,
        reconciler: InventoryReconciler,
        orders: OrderLedger,
        free_items: FreeItemLedger,
        logs: LogLedger,
        backend: Arc<dyn OrderBackend>,
    ) -> Self {
        Self {
            monitor,
            queue,
            reconciler,
            orders,
            free_items,
            logs,
            backend,
        }
    }

    /// Open a new checkout session from a fresh connectivity read
    pub fn begin(&self) -> CheckoutSession {
        let state = if self.monitor.effective_online() {
            CheckoutState::Initial
        } else {
            CheckoutState::Offline
        };
        CheckoutSession {
            order_id: util::new_id(),
            state,
            completed: false,
            message: None,
        }
    }

    /// Submit the cart for the session
    ///
    /// Routes to the online path from `Initial` and the offline confirm path
    /// from `Offline`; any other state is a host bug.
    pub async fn submit(
        &self,
        session: &mut CheckoutSession,
        items: Vec<OrderItem>,
        is_free_order: bool,
    ) -> Result<(), CheckoutError> {
        match session.state {
            CheckoutState::Initial => self.submit_online(session, items, is_free_order).await,
            CheckoutState::Offline => self.confirm_offline(session, items, is_free_order),
            state => Err(CheckoutError::InvalidState { state }),
        }
    }

    async fn submit_online(
        &self,
        session: &mut CheckoutSession,
        items: Vec<OrderItem>,
        is_free_order: bool,
    ) -> Result<(), CheckoutError> {
        session.state = CheckoutState::Processing;
        let payload = self.payload(session, items, is_free_order);

        let response = self.backend.submit_order(&payload).await;
        if !response.is_success() {
            tracing::warn!(order_id = %payload.order_id, message = %response.message, "checkout rejected");
            session.state = CheckoutState::Failed;
            session.message = Some(response.message.clone());
            return Err(CheckoutError::Rejected {
                message: response.message,
            });
        }

        self.reconciler.apply(&payload);
        self.record_order(session, &payload, SyncStatus::Synced)?;

        self.logs.append_best_effort(
            LogEntry::new("checkout_completed", format!("order {}", payload.order_id)),
        );
        session.state = CheckoutState::Success;
        session.completed = true;
        Ok(())
    }

    /// Offline confirm: optimistic local consistency
    ///
    /// The reconciliation is applied locally at once and the same payload is
    /// queued for replay; the order is recorded with a `Pending` sync badge.
    fn confirm_offline(
        &self,
        session: &mut CheckoutSession,
        items: Vec<OrderItem>,
        is_free_order: bool,
    ) -> Result<(), CheckoutError> {
        let payload = self.payload(session, items, is_free_order);

        self.reconciler.apply(&payload);
        self.queue
            .enqueue(PendingAction::inventory_update(payload.clone()))?;
        self.record_order(session, &payload, SyncStatus::Pending)?;

        self.logs.append_best_effort(LogEntry::new(
            "checkout_offline",
            format!("order {} queued for sync", payload.order_id),
        ));
        session.completed = true;
        Ok(())
    }

    fn payload(
        &self,
        session: &CheckoutSession,
        items: Vec<OrderItem>,
        is_free_order: bool,
    ) -> InventoryUpdatePayload {
        InventoryUpdatePayload {
            order_id: session.order_id.clone(),
            items,
            timestamp: util::now_iso(),
            is_free_order,
        }
    }

    fn record_order(
        &self,
        session: &mut CheckoutSession,
        payload: &InventoryUpdatePayload,
        sync_status: SyncStatus,
    ) -> Result<(), CheckoutError> {
        let total = if payload.is_free_order {
            0.0
        } else {
            Order::computed_total(&payload.items)
        };
        let order = Order {
            id: payload.order_id.clone(),
            items: payload.items.clone(),
            total,
            timestamp: payload.timestamp.clone(),
            status: OrderStatus::Completed,
            sync_status,
            is_free_order: payload.is_free_order,
        };

        if let Err(e) = self.orders.append(order) {
            // Full storage exhaustion is one of the two failures that must
            // reach the operator.
            session.state = CheckoutState::Failed;
            session.message = Some("Order could not be saved: storage full".to_string());
            return Err(e.into());
        }

        if payload.is_free_order {
            let record = FreeItemRecord {
                id: util::new_id(),
                order_id: payload.order_id.clone(),
                items: payload.items.clone(),
                reason: None,
                timestamp: payload.timestamp.clone(),
            };
            if let Err(e) = self.free_items.append(record) {
                // Order history is the primary record; a lost giveaway record
                // does not fail the completed sale.
                tracing::warn!(order_id = %payload.order_id, error = %e, "free item record dropped");
            }
        }
        Ok(())
    }
}
