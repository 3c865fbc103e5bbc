//! Shared types for the POS client core
//!
//! Data models and small utilities used by the engine crate and by any
//! host/UI layer embedding it: product stock, orders, log entries, free-item
//! records, pending actions, connectivity state and the unified API response
//! envelope.

pub mod connectivity;
pub mod models;
pub mod pending;
pub mod response;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use connectivity::{ConnectivitySnapshot, ConnectivityStatus};
pub use pending::{InventoryUpdatePayload, PendingAction, PendingActionKind};
pub use response::ApiResponse;
