//! Online checkout flow with a live probe endpoint
//!
//! Runs the connectivity monitor against a local HTTP listener so the
//! session actually transitions to effective-online before checking out.

use std::time::Duration;

use pos_client::checkout::CheckoutState;
use pos_client::store::keys;
use pos_client::{ClientState, Config};
use shared::ConnectivityStatus;
use shared::models::{OrderItem, ProductStock, SyncStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Minimal HEAD-answering endpoint on an ephemeral port
async fn spawn_probe_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n")
                    .await;
            });
        }
    });
    format!("http://{addr}/")
}

fn seed_stock(state: &ClientState, id: &str, quantity: i64) {
    state
        .store()
        .write_collection(
            keys::STOCK_CURATED,
            &[ProductStock {
                id: id.to_string(),
                name: format!("product {id}"),
                price: 6.0,
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
        price: 6.0,
        quantity,
        category: "general".to_string(),
        image: None,
    }]
}

#[tokio::test]
async fn online_checkout_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path().to_string_lossy(), 5 * 1024 * 1024);
    config.probe_url = spawn_probe_endpoint().await;
    config.backend_latency_ms = 20;

    let state = ClientState::initialize(config).unwrap();
    seed_stock(&state, "p1", 5);

    // First probe fires immediately on start.
    state.start_connectivity();
    let mut status = state.connectivity().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| *s == ConnectivityStatus::Connected),
    )
    .await
    .expect("probe never classified the local endpoint as connected")
    .unwrap();

    let mut session = state.checkout().begin();
    assert_eq!(session.state(), CheckoutState::Initial);

    state
        .checkout()
        .submit(&mut session, cart("p1", 3), false)
        .await
        .unwrap();
    assert_eq!(session.state(), CheckoutState::Success);
    assert!(session.dismiss().unwrap());

    let catalog: Vec<ProductStock> = state
        .store()
        .read_collection(keys::STOCK_CURATED)
        .unwrap();
    assert_eq!(catalog[0].quantity, Some(2));

    let orders = state.orders().list().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].sync_status, SyncStatus::Synced);
    assert_eq!(orders[0].total, 18.0);
    assert!(state.pending().is_empty());

    state.shutdown();
}

#[tokio::test]
async fn reconnect_replays_pending_queue() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path().to_string_lossy(), 5 * 1024 * 1024);
    config.probe_url = spawn_probe_endpoint().await;

    let state = ClientState::initialize(config).unwrap();
    seed_stock(&state, "p1", 20);

    // Offline first: the monitor has not probed yet.
    for _ in 0..2 {
        let mut session = state.checkout().begin();
        assert_eq!(session.state(), CheckoutState::Offline);
        state
            .checkout()
            .submit(&mut session, cart("p1", 2), false)
            .await
            .unwrap();
    }
    assert_eq!(state.connectivity_snapshot().pending_actions, 2);

    // Reconnect: host observes the transition and triggers replay.
    state.start_connectivity();
    let mut status = state.connectivity().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| *s == ConnectivityStatus::Connected),
    )
    .await
    .expect("probe never connected")
    .unwrap();

    assert!(state.try_replay_pending());
    assert!(state.pending().is_empty());
    for order in state.orders().list().unwrap() {
        assert_eq!(order.sync_status, SyncStatus::Synced);
    }

    state.shutdown();
}

#[tokio::test]
async fn forced_offline_mode_overrides_a_healthy_link() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path().to_string_lossy(), 5 * 1024 * 1024);
    config.probe_url = spawn_probe_endpoint().await;

    let state = ClientState::initialize(config).unwrap();
    state.start_connectivity();
    let mut status = state.connectivity().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|s| *s == ConnectivityStatus::Connected),
    )
    .await
    .expect("probe never connected")
    .unwrap();

    // Operator forces offline mode: checkout must take the offline path
    // even though the link is healthy.
    assert!(!state.connectivity().toggle_mode());
    let session = state.checkout().begin();
    assert_eq!(session.state(), CheckoutState::Offline);

    state.shutdown();
}
