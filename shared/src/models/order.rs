//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Completed,
    Processing,
    Canceled,
}

/// Whether an order has been processed through the network path
///
/// Orders created while offline are applied locally and marked `Pending`
/// until the pending action queue replays them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
}

/// Order line item
///
/// Name/price/category/image are denormalized from the product record so the
/// order history renders without a catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    pub image: Option<String>,
}

/// Order entity (order history record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Client-side generated order ID
    pub id: String,
    pub items: Vec<OrderItem>,
    /// Total amount in currency unit
    pub total: f64,
    /// ISO-8601 completion timestamp
    pub timestamp: String,
    pub status: OrderStatus,
    pub sync_status: SyncStatus,
    pub is_free_order: bool,
}

impl Order {
    /// Sum of `price * quantity` over the line items
    pub fn computed_total(items: &[OrderItem]) -> f64 {
        items.iter().map(|i| i.price * i.quantity as f64).sum()
    }
}
