//! HTTP route handlers for the order API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the database)
//!
//! # Orders
//! POST   /api/orders                    - Create an order
//! GET    /api/orders                    - List orders (status/source filters, paging)
//! GET    /api/orders/{id}               - Order with customer, address and items
//! PUT    /api/orders/{id}               - Partial update (status, payment, source, notes)
//! DELETE /api/orders/{id}               - Delete an order and its items
//! PUT    /api/orders/{id}/status        - Status-only update
//!
//! # Order items
//! GET  /api/orders/{id}/items           - Items with product details
//! POST /api/orders/{id}/items           - Add an item at the current catalog price
//! PUT  /api/orders/{id}/items           - Bulk quantity update
//!
//! # Customers
//! GET  /api/customers/{id}/orders       - Customer order history
//!
//! # Analytics
//! GET  /api/orders/analytics            - Aggregates for a period (day/week/month/year)
//! ```

pub mod analytics;
pub mod customers;
pub mod order_items;
pub mod orders;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/analytics", get(analytics::summary))
        .route(
            "/orders/{id}",
            get(orders::get)
                .put(orders::update)
                .delete(orders::delete),
        )
        .route("/orders/{id}/status", put(orders::update_status))
        .route(
            "/orders/{id}/items",
            get(order_items::list)
                .post(order_items::add)
                .put(order_items::update_quantities),
        )
        .route("/customers/{id}/orders", get(customers::orders))
}

/// Default page size for list endpoints.
const DEFAULT_LIMIT: i64 = 10;
/// Upper bound on page size.
const MAX_LIMIT: i64 = 100;

/// Clamp raw paging parameters to sane bounds.
fn sanitize_paging(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_paging_defaults() {
        assert_eq!(sanitize_paging(None, None), (1, 10));
    }

    #[test]
    fn test_sanitize_paging_clamps() {
        assert_eq!(sanitize_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(sanitize_paging(Some(-3), Some(5000)), (1, 100));
        assert_eq!(sanitize_paging(Some(4), Some(25)), (4, 25));
    }
}
