//! Catalog product models.
//!
//! Product CRUD lives outside this service; the order subsystem only reads
//! products (price snapshots, existence checks) and never touches stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mercadito_core::ProductId;

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional stock-keeping unit.
    pub sku: Option<String>,
    /// Current unit price.
    pub price: Decimal,
    /// Units on hand (never decremented by the order subsystem).
    pub stock: i64,
    /// Whether the product is visible to the storefront.
    pub is_active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The slice of a product embedded in order payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current catalog price (not the order's snapshot).
    pub price: Decimal,
}

/// Input for inserting a catalog product (CLI seeding and tests).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional stock-keeping unit.
    pub sku: Option<String>,
    /// Current unit price.
    pub price: Decimal,
    /// Units on hand.
    pub stock: i64,
    /// Whether the product is visible to the storefront.
    pub is_active: bool,
}
