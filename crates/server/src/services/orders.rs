//! Order creation and item-mutation services.
//!
//! The creation path totals the caller-supplied per-item prices; it does not
//! re-query the catalog. The add-item path does the opposite: it snapshots
//! the product's current catalog price. Both finish by writing a total that
//! equals the sum over the order's stored items.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, TimeDelta, Utc};
use rand::Rng;
use sqlx::SqlitePool;

use mercadito_core::{
    CustomerId, Email, OrderId, OrderSource, OrderStatus, PaymentMethod, pricing,
};

use crate::db::{NewOrder, OrderFilter, OrderRepository};
use crate::error::{AppError, Result};
use crate::models::order::{
    AddItemRequest, CreateOrderRequest, OrderAnalytics, OrderItemWithProduct, OrderListResponse,
    OrderWithDetails, Pagination, UpdateItemsRequest,
};

/// Reporting window for order analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl AnalyticsPeriod {
    /// Parse a query-string period, falling back to a month window.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("day") => Self::Day,
            Some("week") => Self::Week,
            Some("year") => Self::Year,
            _ => Self::Month,
        }
    }

    /// Label used in the response payload.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Start of the window, counting back from `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => now - TimeDelta::days(1),
            Self::Week => now - TimeDelta::days(7),
            Self::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            Self::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }
}

/// Order orchestration: validation, customer resolution, total derivation,
/// and item mutations.
pub struct OrderService<'a> {
    repo: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service over the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            repo: OrderRepository::new(pool),
        }
    }

    /// Create an order from a storefront/back-office payload.
    ///
    /// Validates the request, derives the total from the caller-supplied
    /// item prices, generates the order number, and persists the whole
    /// aggregate atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for validation failures (nothing is
    /// persisted) and [`AppError::NotFound`] if an item references an
    /// unknown product (the transaction rolls back).
    pub async fn create_order(&self, req: CreateOrderRequest) -> Result<OrderWithDetails> {
        let email = validate(&req)?;

        let total = pricing::order_total(
            req.order_items
                .iter()
                .map(|item| (item.quantity, item.price)),
        )
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let order = self
            .repo
            .create(NewOrder {
                email,
                total_amount: pricing::round_currency(total),
                order_number: generate_order_number(),
                status: req.status.unwrap_or_default(),
                source: req.source.unwrap_or_default(),
                payment_method: req.payment_method,
                notes: req.notes,
                customer: req.customer,
                address: req.address,
                items: req.order_items,
            })
            .await?;

        tracing::info!(
            order_id = %order.order.id,
            order_number = %order.order.order_number,
            total = %order.order.total_amount,
            "Order created"
        );
        Ok(order)
    }

    /// Add an item to an existing order at the product's current catalog
    /// price, then resynchronize the stored total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for a non-positive quantity and
    /// [`AppError::NotFound`] for an unknown order or product.
    pub async fn add_item(
        &self,
        order_id: OrderId,
        req: AddItemRequest,
    ) -> Result<OrderItemWithProduct> {
        if req.quantity < 1 {
            return Err(AppError::BadRequest(
                "Item quantity must be positive".to_owned(),
            ));
        }

        let item = self
            .repo
            .add_item(order_id, req.product_id, req.quantity)
            .await?;

        tracing::info!(%order_id, item_id = %item.item.id, "Order item added");
        Ok(item)
    }

    /// Apply bulk quantity updates to an order's items. Updates naming items
    /// that do not belong to the order are skipped without failing the
    /// batch; the total recompute runs regardless.
    ///
    /// Returns the order's current items.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for a non-positive quantity and
    /// [`AppError::NotFound`] for an unknown order.
    pub async fn update_items(
        &self,
        order_id: OrderId,
        req: UpdateItemsRequest,
    ) -> Result<Vec<OrderItemWithProduct>> {
        if req.items.iter().any(|item| item.quantity < 1) {
            return Err(AppError::BadRequest(
                "Item quantity must be positive".to_owned(),
            ));
        }

        let items = self.repo.update_item_quantities(order_id, &req.items).await?;
        tracing::info!(%order_id, updated = req.items.len(), "Order items updated");
        Ok(items)
    }

    /// Paginated, optionally filtered order list.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on persistence failure.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<OrderListResponse> {
        let (orders, total) = self.repo.list(filter).await?;
        Ok(OrderListResponse {
            orders,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Paginated order history for one customer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on persistence failure.
    pub async fn list_customer_orders(
        &self,
        customer_id: CustomerId,
        page: i64,
        limit: i64,
    ) -> Result<OrderListResponse> {
        let (orders, total) = self.repo.list_for_customer(customer_id, page, limit).await?;
        Ok(OrderListResponse {
            orders,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Aggregate order metrics over the given reporting window.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on persistence failure.
    pub async fn analytics(&self, period: AnalyticsPeriod) -> Result<OrderAnalytics> {
        let stats = self.repo.stats_since(period.since(Utc::now())).await?;

        let mut by_status: BTreeMap<String, i64> = OrderStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_owned(), 0))
            .collect();
        for status in &stats.by_status {
            *by_status.entry(status.as_str().to_owned()).or_default() += 1;
        }

        let mut by_source: BTreeMap<String, i64> = OrderSource::ALL
            .iter()
            .map(|s| (s.as_str().to_owned(), 0))
            .collect();
        for source in &stats.by_source {
            *by_source.entry(source.as_str().to_owned()).or_default() += 1;
        }

        let mut by_payment: BTreeMap<String, i64> = PaymentMethod::ALL
            .iter()
            .map(|m| (m.as_str().to_owned(), 0))
            .collect();
        for method in &stats.by_payment_method {
            *by_payment.entry(method.as_str().to_owned()).or_default() += 1;
        }

        let pending = by_status.get(OrderStatus::Pending.as_str()).copied();
        let completed = by_status.get(OrderStatus::Delivered.as_str()).copied();

        Ok(OrderAnalytics {
            period: period.label().to_owned(),
            total_orders: stats.total_orders,
            total_revenue: stats.total_revenue,
            pending_orders: pending.unwrap_or(0),
            completed_orders: completed.unwrap_or(0),
            orders_by_status: by_status,
            orders_by_source: by_source,
            orders_by_payment_method: by_payment,
        })
    }
}

/// Validate an order-creation request, returning the parsed customer email.
fn validate(req: &CreateOrderRequest) -> Result<Email> {
    if req.customer.name.trim().is_empty() {
        return Err(AppError::BadRequest("Customer name is required".to_owned()));
    }

    let email = Email::parse(req.customer.email.trim())
        .map_err(|e| AppError::BadRequest(format!("Customer email is invalid: {e}")))?;

    for (value, field) in [
        (&req.address.street, "street"),
        (&req.address.city, "city"),
        (&req.address.state, "state"),
        (&req.address.zip_code, "zip code"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("Address {field} is required")));
        }
    }

    if req.order_items.is_empty() {
        return Err(AppError::BadRequest("Order items are required".to_owned()));
    }

    for item in &req.order_items {
        if item.quantity < 1 {
            return Err(AppError::BadRequest(
                "Item quantity must be positive".to_owned(),
            ));
        }
        if item.price.is_sign_negative() {
            return Err(AppError::BadRequest(
                "Item price cannot be negative".to_owned(),
            ));
        }
    }

    Ok(email)
}

/// Generate a human-readable order number: `ORD-<unix millis>-<9 base36 chars>`.
///
/// Uniqueness is probabilistic; the database carries a unique index as the
/// backstop.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| {
            let digit = rng.random_range(0..36u32);
            char::from_digit(digit, 36).unwrap_or('0')
        })
        .collect();
    format!("ORD-{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use mercadito_core::ProductId;

    use super::*;
    use crate::db::ProductRepository;
    use crate::models::address::AddressInput;
    use crate::models::customer::CustomerInput;
    use crate::models::order::{ItemQuantityUpdate, OrderItemInput};
    use crate::models::product::{NewProduct, Product};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect in-memory database");
        crate::db::MIGRATOR.run(&pool).await.expect("run migrations");
        pool
    }

    async fn seed_product(pool: &SqlitePool, name: &str, price: rust_decimal::Decimal) -> Product {
        ProductRepository::new(pool)
            .create(&NewProduct {
                name: name.to_owned(),
                description: None,
                sku: None,
                price,
                stock: 10,
                is_active: true,
            })
            .await
            .expect("seed product")
    }

    fn order_request(items: Vec<OrderItemInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: CustomerInput {
                name: "Ana Torres".to_owned(),
                email: "ana@example.com".to_owned(),
                phone: Some("555-0100".to_owned()),
            },
            address: AddressInput {
                street: "1 Main St".to_owned(),
                city: "Austin".to_owned(),
                state: "TX".to_owned(),
                zip_code: "78701".to_owned(),
                country: None,
            },
            order_items: items,
            payment_method: PaymentMethod::Cash,
            status: None,
            source: None,
            notes: None,
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        use sqlx::Row;
        sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(pool)
            .await
            .expect("count query")
            .try_get("n")
            .expect("count column")
    }

    #[tokio::test]
    async fn test_create_order_derives_total_from_items() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Tamarind candy", dec!(9.99)).await;
        let service = OrderService::new(&pool);

        let order = service
            .create_order(order_request(vec![OrderItemInput {
                product_id: product.id,
                quantity: 3,
                price: dec!(9.99),
            }]))
            .await
            .expect("create order");

        assert_eq!(order.order.total_amount, dec!(29.97));
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.order.source, OrderSource::Website);
        assert!(order.order.order_number.starts_with("ORD-"));
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.address.country, "US");
    }

    #[tokio::test]
    async fn test_create_order_trusts_caller_price_not_catalog() {
        // The creation path totals the payload's prices even when the
        // catalog disagrees; only add_item re-fetches.
        let pool = test_pool().await;
        let product = seed_product(&pool, "Hibiscus tea", dec!(12.00)).await;
        let service = OrderService::new(&pool);

        let order = service
            .create_order(order_request(vec![OrderItemInput {
                product_id: product.id,
                quantity: 2,
                price: dec!(1.00),
            }]))
            .await
            .expect("create order");

        assert_eq!(order.order.total_amount, dec!(2.00));
    }

    #[tokio::test]
    async fn test_create_order_reuses_customer_by_email() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Mole paste", dec!(8.50)).await;
        let service = OrderService::new(&pool);

        let item = || {
            vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
                price: dec!(8.50),
            }]
        };

        let first = service.create_order(order_request(item())).await.expect("first");
        let second = service.create_order(order_request(item())).await.expect("second");

        assert_eq!(first.customer.id, second.customer.id);
        assert_eq!(count(&pool, "customers").await, 1);
        // Addresses are never reused.
        assert_eq!(count(&pool, "addresses").await, 2);
    }

    #[tokio::test]
    async fn test_create_order_with_empty_items_persists_nothing() {
        let pool = test_pool().await;
        let service = OrderService::new(&pool);

        let err = service
            .create_order(order_request(Vec::new()))
            .await
            .expect_err("should fail validation");
        assert!(matches!(err, AppError::BadRequest(_)));

        assert_eq!(count(&pool, "customers").await, 0);
        assert_eq!(count(&pool, "addresses").await, 0);
        assert_eq!(count(&pool, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_create_order_unknown_product_rolls_back_everything() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Horchata mix", dec!(6.25)).await;
        let service = OrderService::new(&pool);

        let err = service
            .create_order(order_request(vec![
                OrderItemInput {
                    product_id: product.id,
                    quantity: 1,
                    price: dec!(6.25),
                },
                OrderItemInput {
                    product_id: ProductId::new(9999),
                    quantity: 1,
                    price: dec!(1.00),
                },
            ]))
            .await
            .expect_err("unknown product");
        assert!(matches!(err, AppError::NotFound(_)));

        // The whole transaction rolled back: not even the customer exists.
        assert_eq!(count(&pool, "customers").await, 0);
        assert_eq!(count(&pool, "addresses").await, 0);
        assert_eq!(count(&pool, "orders").await, 0);
        assert_eq!(count(&pool, "order_items").await, 0);
    }

    #[tokio::test]
    async fn test_add_item_snapshots_catalog_price_and_updates_total() {
        let pool = test_pool().await;
        let first = seed_product(&pool, "Tamarind candy", dec!(9.99)).await;
        let second = seed_product(&pool, "Lime salt", dec!(5.00)).await;
        let service = OrderService::new(&pool);

        let order = service
            .create_order(order_request(vec![OrderItemInput {
                product_id: first.id,
                quantity: 3,
                price: dec!(9.99),
            }]))
            .await
            .expect("create order");
        assert_eq!(order.order.total_amount, dec!(29.97));

        let added = service
            .add_item(
                order.order.id,
                AddItemRequest {
                    product_id: second.id,
                    quantity: 1,
                },
            )
            .await
            .expect("add item");
        assert_eq!(added.item.price, dec!(5.00));

        let repo = OrderRepository::new(&pool);
        let updated = repo
            .get_with_details(order.order.id)
            .await
            .expect("fetch")
            .expect("order exists");
        assert_eq!(updated.order.total_amount, dec!(34.97));
        assert_eq!(updated.order_items.len(), 2);
    }

    #[tokio::test]
    async fn test_add_item_unknown_product_is_not_found() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Cinnamon sticks", dec!(4.00)).await;
        let service = OrderService::new(&pool);

        let order = service
            .create_order(order_request(vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
                price: dec!(4.00),
            }]))
            .await
            .expect("create order");

        let err = service
            .add_item(
                order.order.id,
                AddItemRequest {
                    product_id: ProductId::new(404),
                    quantity: 1,
                },
            )
            .await
            .expect_err("unknown product");
        assert!(matches!(err, AppError::NotFound(_)));

        // Total unchanged.
        let updated = OrderRepository::new(&pool)
            .get_with_details(order.order.id)
            .await
            .expect("fetch")
            .expect("order exists");
        assert_eq!(updated.order.total_amount, dec!(4.00));
    }

    #[tokio::test]
    async fn test_add_item_rejects_non_positive_quantity() {
        let pool = test_pool().await;
        let service = OrderService::new(&pool);

        let err = service
            .add_item(
                OrderId::new(1),
                AddItemRequest {
                    product_id: ProductId::new(1),
                    quantity: 0,
                },
            )
            .await
            .expect_err("zero quantity");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_items_skips_foreign_items_but_applies_valid_ones() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Tamarind candy", dec!(10.00)).await;
        let service = OrderService::new(&pool);

        let make = |qty: i64| {
            order_request(vec![OrderItemInput {
                product_id: product.id,
                quantity: qty,
                price: dec!(10.00),
            }])
        };

        let target = service.create_order(make(1)).await.expect("target order");
        let other = service.create_order(make(1)).await.expect("other order");

        let target_item = target.order_items.first().expect("target item").item.id;
        let foreign_item = other.order_items.first().expect("other item").item.id;

        let items = service
            .update_items(
                target.order.id,
                UpdateItemsRequest {
                    items: vec![
                        ItemQuantityUpdate {
                            id: target_item,
                            quantity: 4,
                        },
                        // Belongs to a different order: silently skipped.
                        ItemQuantityUpdate {
                            id: foreign_item,
                            quantity: 99,
                        },
                    ],
                },
            )
            .await
            .expect("batch update");

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().expect("item").item.quantity, 4);

        let repo = OrderRepository::new(&pool);
        let target_after = repo
            .get_with_details(target.order.id)
            .await
            .expect("fetch")
            .expect("exists");
        assert_eq!(target_after.order.total_amount, dec!(40.00));

        let other_after = repo
            .get_with_details(other.order.id)
            .await
            .expect("fetch")
            .expect("exists");
        assert_eq!(
            other_after.order_items.first().expect("item").item.quantity,
            1
        );
        assert_eq!(other_after.order.total_amount, dec!(10.00));
    }

    #[tokio::test]
    async fn test_update_items_unknown_order_is_not_found() {
        let pool = test_pool().await;
        let service = OrderService::new(&pool);

        let err = service
            .update_items(
                OrderId::new(123),
                UpdateItemsRequest {
                    items: vec![ItemQuantityUpdate {
                        id: mercadito_core::OrderItemId::new(1),
                        quantity: 2,
                    }],
                },
            )
            .await
            .expect_err("unknown order");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_analytics_counts_and_exact_revenue() {
        let pool = test_pool().await;
        let product = seed_product(&pool, "Tamarind candy", dec!(0.10)).await;
        let service = OrderService::new(&pool);

        for _ in 0..3 {
            service
                .create_order(order_request(vec![OrderItemInput {
                    product_id: product.id,
                    quantity: 1,
                    price: dec!(0.10),
                }]))
                .await
                .expect("create order");
        }

        let analytics = service
            .analytics(AnalyticsPeriod::Month)
            .await
            .expect("analytics");
        assert_eq!(analytics.total_orders, 3);
        assert_eq!(analytics.total_revenue, dec!(0.30));
        assert_eq!(analytics.pending_orders, 3);
        assert_eq!(analytics.completed_orders, 0);
        assert_eq!(analytics.orders_by_status.get("PENDING"), Some(&3));
        assert_eq!(analytics.orders_by_source.get("WEBSITE"), Some(&3));
        assert_eq!(analytics.orders_by_payment_method.get("CASH"), Some(&3));
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let mut parts = number.splitn(3, '-');
        assert_eq!(parts.next(), Some("ORD"));
        let millis = parts.next().expect("timestamp part");
        assert!(millis.parse::<i64>().is_ok());
        let suffix = parts.next().expect("suffix part");
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_analytics_period_parse() {
        assert_eq!(AnalyticsPeriod::parse(Some("day")), AnalyticsPeriod::Day);
        assert_eq!(AnalyticsPeriod::parse(Some("bogus")), AnalyticsPeriod::Month);
        assert_eq!(AnalyticsPeriod::parse(None), AnalyticsPeriod::Month);
    }
}
