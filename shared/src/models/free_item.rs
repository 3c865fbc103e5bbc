//! Free Item Record Model

use serde::{Deserialize, Serialize};

use super::order::OrderItem;

/// Record of items given away on a free order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeItemRecord {
    pub id: String,
    /// Order this giveaway belongs to
    pub order_id: String,
    pub items: Vec<OrderItem>,
    pub reason: Option<String>,
    /// ISO-8601 timestamp
    pub timestamp: String,
}
