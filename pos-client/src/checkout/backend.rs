//! Order submission backend seam
//!
//! The online checkout path goes through this trait so the host can swap in
//! a real transport. The bundled implementation simulates the backend call
//! with a fixed latency and an accepting response.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::ApiResponse;
use shared::pending::InventoryUpdatePayload;

/// Acknowledgement returned by a successful order submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
}

/// Order submission endpoint
///
/// A transport failure is reported as a non-success [`ApiResponse`], never a
/// panic or a Rust error: the checkout flow treats any non-success response
/// as a failed checkout.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn submit_order(&self, payload: &InventoryUpdatePayload) -> ApiResponse<OrderAck>;
}

/// Latency-simulating backend that accepts every order
pub struct SimulatedBackend {
    latency: Duration,
}

impl SimulatedBackend {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
        }
    }
}

#[async_trait]
impl OrderBackend for SimulatedBackend {
    async fn submit_order(&self, payload: &InventoryUpdatePayload) -> ApiResponse<OrderAck> {
        tokio::time::sleep(self.latency).await;
        tracing::debug!(order_id = %payload.order_id, "simulated order submission accepted");
        ApiResponse::ok(OrderAck {
            order_id: payload.order_id.clone(),
        })
    }
}
