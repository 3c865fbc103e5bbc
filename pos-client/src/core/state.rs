//! Client state aggregation
//!
//! [`ClientState`] wires the engine together for the host application: one
//! store, the three ledgers, the reconciler, the pending queue, the
//! connectivity monitor and the checkout flow.

use std::path::Path;
use std::sync::Arc;

use shared::ConnectivitySnapshot;
use tokio_util::sync::CancellationToken;

use crate::checkout::{CheckoutFlow, OrderBackend, SimulatedBackend};
use crate::connectivity::ConnectivityMonitor;
use crate::inventory::InventoryReconciler;
use crate::ledger::{FreeItemLedger, LogLedger, OrderLedger};
use crate::pending::PendingQueue;
use crate::store::{RecordStore, StoreError};

/// Record store file name under the work directory
const STORE_FILE: &str = "pos-client.redb";

pub struct ClientState {
    config: crate::core::Config,
    store: RecordStore,
    logs: LogLedger,
    orders: OrderLedger,
    free_items: FreeItemLedger,
    reconciler: InventoryReconciler,
    queue: Arc<PendingQueue>,
    monitor: Arc<ConnectivityMonitor>,
    checkout: CheckoutFlow,
    shutdown: CancellationToken,
}

impl ClientState {
    /// Initialize with the simulated order backend
    pub fn initialize(config: crate::core::Config) -> Result<Self, StoreError> {
        let backend = Arc::new(SimulatedBackend::new(config.backend_latency_ms));
        Self::initialize_with_backend(config, backend)
    }

    /// Initialize with a host-provided order backend
    pub fn initialize_with_backend(
        config: crate::core::Config,
        backend: Arc<dyn OrderBackend>,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = RecordStore::open(
            Path::new(&config.work_dir).join(STORE_FILE),
            config.store_quota_bytes,
        )?;

        let logs = LogLedger::new(store.clone());
        let orders = OrderLedger::new(store.clone(), logs.clone());
        let free_items = FreeItemLedger::new(store.clone(), logs.clone());
        let reconciler = InventoryReconciler::new(store.clone(), logs.clone());
        let queue = Arc::new(PendingQueue::load(store.clone())?);
        let monitor = Arc::new(ConnectivityMonitor::new(&config));

        let checkout = CheckoutFlow::new(
            Arc::clone(&monitor),
            Arc::clone(&queue),
            reconciler.clone(),
            orders.clone(),
            free_items.clone(),
            logs.clone(),
            backend,
        );

        tracing::info!(
            work_dir = %config.work_dir,
            quota_bytes = config.store_quota_bytes,
            pending = queue.len(),
            "client state initialized"
        );

        Ok(Self {
            config,
            store,
            logs,
            orders,
            free_items,
            reconciler,
            queue,
            monitor,
            checkout,
            shutdown: CancellationToken::new(),
        })
    }

    /// Spawn the connectivity monitor loop on the current runtime
    pub fn start_connectivity(&self) {
        let monitor = Arc::clone(&self.monitor);
        let token = self.shutdown.child_token();
        tokio::spawn(monitor.run(token));
    }

    /// Stop background tasks
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Replay the pending queue if it is allowed to run
    ///
    /// Gate per the queue contract: effective-online and a non-empty queue.
    /// The host calls this when it observes a connectivity transition to
    /// online with a positive pending count.
    pub fn try_replay_pending(&self) -> bool {
        if !self.monitor.effective_online() || self.queue.is_empty() {
            return false;
        }
        self.queue.replay(&self.reconciler, &self.orders)
    }

    /// Connectivity view with the pending count filled in
    pub fn connectivity_snapshot(&self) -> ConnectivitySnapshot {
        self.monitor.snapshot(self.queue.len())
    }

    pub fn config(&self) -> &crate::core::Config {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn logs(&self) -> &LogLedger {
        &self.logs
    }

    pub fn orders(&self) -> &OrderLedger {
        &self.orders
    }

    pub fn free_items(&self) -> &FreeItemLedger {
        &self.free_items
    }

    pub fn reconciler(&self) -> &InventoryReconciler {
        &self.reconciler
    }

    pub fn pending(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn checkout(&self) -> &CheckoutFlow {
        &self.checkout
    }
}
