//! Product Stock Model

use serde::{Deserialize, Serialize};

/// Which catalog a stock record belongs to
///
/// The two catalogs are disjoint collections: `Curated` ships with the store
/// configuration, `UserAdded` holds products created on the device. A product
/// id is unique within its own catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Catalog {
    Curated,
    UserAdded,
}

/// Stock record for a single product
///
/// `quantity` is optional in the persisted form: records imported without an
/// explicit on-hand count are treated as holding the default stock level when
/// first reconciled. Once written by the reconciler the quantity is always a
/// non-negative number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStock {
    pub id: String,
    pub name: String,
    /// Price in currency unit
    pub price: f64,
    /// Category reference (String ID)
    pub category: String,
    pub image: Option<String>,
    /// Quantity on hand; `None` means "never counted"
    pub quantity: Option<i64>,
}
