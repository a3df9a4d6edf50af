//! Order aggregate models and request/response DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mercadito_core::{
    AddressId, CustomerId, OrderId, OrderItemId, OrderSource, OrderStatus, PaymentMethod,
    ProductId,
};

use super::address::{Address, AddressInput};
use super::customer::{Customer, CustomerInput};
use super::product::ProductSummary;

/// An order row.
///
/// `total_amount` is derived from the order's items and persisted; every
/// operation that touches items resynchronizes it before committing.
/// `order_number` is generated once at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-readable order number (`ORD-<millis>-<suffix>`).
    pub order_number: String,
    /// Workflow status (caller-supplied, never computed here).
    pub status: OrderStatus,
    /// Channel the order came in through.
    pub source: OrderSource,
    /// Payment method recorded on the order.
    pub payment_method: PaymentMethod,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Derived total, rounded to currency precision at storage.
    pub total_amount: Decimal,
    /// Customer the order belongs to.
    pub customer_id: CustomerId,
    /// Shipping address created with the order.
    pub address_id: AddressId,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A line item belonging to exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Unique item ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Units ordered (positive).
    pub quantity: i64,
    /// Unit price snapshotted when the item was attached to the order.
    pub price: Decimal,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
}

/// An order item with its product summary, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemWithProduct {
    /// The item itself.
    #[serde(flatten)]
    pub item: OrderItem,
    /// Summary of the referenced product.
    pub product: ProductSummary,
}

/// A fully populated order: nested customer, address, and items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithDetails {
    /// The order itself.
    #[serde(flatten)]
    pub order: Order,
    /// The customer the order belongs to.
    pub customer: Customer,
    /// The shipping address created with the order.
    pub address: Address,
    /// Line items with product summaries.
    pub order_items: Vec<OrderItemWithProduct>,
}

/// A requested line item in an order-creation payload.
///
/// The price here is caller-supplied and totaled as-is; the add-item
/// endpoint is the path that re-fetches the catalog price instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    /// Referenced product.
    pub product_id: ProductId,
    /// Units ordered (must be positive).
    pub quantity: i64,
    /// Unit price to snapshot.
    pub price: Decimal,
}

/// Order-creation request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Customer identity fields (resolved or created by email).
    pub customer: CustomerInput,
    /// Shipping address fields.
    pub address: AddressInput,
    /// Requested line items (must be non-empty).
    pub order_items: Vec<OrderItemInput>,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Workflow status; PENDING when omitted.
    pub status: Option<OrderStatus>,
    /// Source channel; WEBSITE when omitted.
    pub source: Option<OrderSource>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Add-item request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Product to add; its current catalog price becomes the snapshot.
    pub product_id: ProductId,
    /// Units to add (must be positive).
    pub quantity: i64,
}

/// One entry of a bulk quantity update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuantityUpdate {
    /// Item to update; ids not belonging to the target order are skipped.
    pub id: OrderItemId,
    /// New quantity (must be positive).
    pub quantity: i64,
}

/// Bulk item-update request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemsRequest {
    /// Quantity updates to apply.
    pub items: Vec<ItemQuantityUpdate>,
}

/// Partial order update (no item or total changes).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// New workflow status.
    pub status: Option<OrderStatus>,
    /// New payment method.
    pub payment_method: Option<PaymentMethod>,
    /// New source channel.
    pub source: Option<OrderSource>,
    /// New notes (replaces existing).
    pub notes: Option<String>,
}

impl UpdateOrderRequest {
    /// Whether the update carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.payment_method.is_none()
            && self.source.is_none()
            && self.notes.is_none()
    }
}

/// Status-only update payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// New workflow status.
    pub status: OrderStatus,
}

/// Pagination envelope for list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Total matching rows.
    pub total: i64,
    /// Total pages.
    pub pages: i64,
}

impl Pagination {
    /// Build a pagination envelope from a page request and total row count.
    #[must_use]
    pub const fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            // `i64::div_ceil` is unstable (`int_roundings`); this matches its
            // definition for a positive divisor.
            if total % limit > 0 {
                total / limit + 1
            } else {
                total / limit
            }
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Paginated order list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    /// Orders on this page, newest first.
    pub orders: Vec<OrderWithDetails>,
    /// Pagination envelope.
    pub pagination: Pagination,
}

/// Aggregated order metrics over a reporting window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnalytics {
    /// The reporting period ("day", "week", "month", "year").
    pub period: String,
    /// Orders created in the window.
    pub total_orders: i64,
    /// Exact revenue sum over the window.
    pub total_revenue: Decimal,
    /// Orders still pending.
    pub pending_orders: i64,
    /// Orders delivered.
    pub completed_orders: i64,
    /// Order counts keyed by status wire name.
    pub orders_by_status: BTreeMap<String, i64>,
    /// Order counts keyed by source wire name.
    pub orders_by_source: BTreeMap<String, i64>,
    /// Order counts keyed by payment-method wire name.
    pub orders_by_payment_method: BTreeMap<String, i64>,
}
