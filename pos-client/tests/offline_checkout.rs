//! Offline checkout flow against a real on-disk store
//!
//! Covers the optimistic local apply, durable pending queue, restart
//! survival and the replay-after-reconnect semantics (including the
//! documented double-decrement of locally-applied-then-replayed payloads).

use pos_client::checkout::CheckoutState;
use pos_client::store::keys;
use pos_client::{ClientState, Config};
use shared::models::{OrderItem, OrderStatus, ProductStock, SyncStatus};

fn config(dir: &tempfile::TempDir) -> Config {
    Config::with_overrides(dir.path().to_string_lossy(), 5 * 1024 * 1024)
}

fn seed_stock(state: &ClientState, id: &str, quantity: i64) {
    state
        .store()
        .write_collection(
            keys::STOCK_CURATED,
            &[ProductStock {
                id: id.to_string(),
                name: format!("product {id}"),
                price: 3.0,
                category: "general".to_string(),
                image: None,
                quantity: Some(quantity),
            }],
        )
        .unwrap();
}

fn cart(product_id: &str, quantity: i64) -> Vec<OrderItem> {
    vec![OrderItem {
        product_id: product_id.to_string(),
        name: format!("product {product_id}"),
        price: 3.0,
        quantity,
        category: "general".to_string(),
        image: None,
    }]
}

fn stock_of(state: &ClientState, id: &str) -> Option<i64> {
    let catalog: Vec<ProductStock> = state
        .store()
        .read_collection(keys::STOCK_CURATED)
        .unwrap();
    catalog.iter().find(|p| p.id == id).and_then(|p| p.quantity)
}

#[tokio::test]
async fn offline_checkout_applies_locally_and_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let state = ClientState::initialize(config(&dir)).unwrap();
    seed_stock(&state, "p1", 5);

    // Never probed: effective connectivity is offline.
    let mut session = state.checkout().begin();
    assert_eq!(session.state(), CheckoutState::Offline);

    state
        .checkout()
        .submit(&mut session, cart("p1", 2), false)
        .await
        .unwrap();

    assert_eq!(stock_of(&state, "p1"), Some(3));
    assert_eq!(state.pending().len(), 1);

    let orders = state.orders().list().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Completed);
    assert_eq!(orders[0].sync_status, SyncStatus::Pending);

    let snapshot = state.connectivity_snapshot();
    assert_eq!(snapshot.pending_actions, 1);
    assert!(!snapshot.effective_online());

    // Restart: the queue and all collections come back from disk.
    drop(state);
    let reopened = ClientState::initialize(config(&dir)).unwrap();
    assert_eq!(reopened.pending().len(), 1);
    assert_eq!(stock_of(&reopened, "p1"), Some(3));
    assert_eq!(reopened.orders().list().unwrap().len(), 1);
}

#[tokio::test]
async fn replay_is_gated_on_effective_online() {
    let dir = tempfile::tempdir().unwrap();
    let state = ClientState::initialize(config(&dir)).unwrap();
    seed_stock(&state, "p1", 5);

    let mut session = state.checkout().begin();
    state
        .checkout()
        .submit(&mut session, cart("p1", 1), false)
        .await
        .unwrap();
    assert_eq!(state.pending().len(), 1);

    // Still disconnected: the gate refuses to replay.
    assert!(!state.try_replay_pending());
    assert_eq!(state.pending().len(), 1);
}

#[tokio::test]
async fn replay_applies_in_order_then_clears_and_flips_sync_badges() {
    let dir = tempfile::tempdir().unwrap();
    let state = ClientState::initialize(config(&dir)).unwrap();
    seed_stock(&state, "p1", 10);

    // Two offline orders against the same product: replay must apply the
    // first fully before the second.
    for qty in [3, 4] {
        let mut session = state.checkout().begin();
        state
            .checkout()
            .submit(&mut session, cart("p1", qty), false)
            .await
            .unwrap();
    }
    // Both applied locally already: 10 - 3 - 4.
    assert_eq!(stock_of(&state, "p1"), Some(3));
    assert_eq!(state.pending().len(), 2);

    let ok = state.pending().replay(state.reconciler(), state.orders());
    assert!(ok);
    assert!(state.pending().is_empty());

    // Replay re-applies payloads that were already applied locally; the
    // queue bounds duplication, it does not deduplicate.
    assert_eq!(stock_of(&state, "p1"), Some(0));

    for order in state.orders().list().unwrap() {
        assert_eq!(order.sync_status, SyncStatus::Synced);
    }
}
