//! Order aggregate repository.
//!
//! Order creation writes the customer resolution, address, order row, and
//! all line items as one transaction; a failure at any point (including an
//! unknown product) rolls the whole operation back, so no partial order is
//! ever observable. Item mutations recompute the stored total inside the
//! same transaction as the mutation, keeping
//! `orders.total_amount == sum(quantity * price)` at every commit point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use mercadito_core::{
    CustomerId, OrderId, OrderSource, OrderStatus, PaymentMethod, pricing,
};

use super::{RepositoryError, customers, decimal_column, enum_column, products};
use crate::models::address::{Address, AddressInput};
use crate::models::customer::CustomerInput;
use crate::models::order::{
    ItemQuantityUpdate, Order, OrderItem, OrderItemInput, OrderItemWithProduct, OrderWithDetails,
    UpdateOrderRequest,
};

use mercadito_core::Email;

/// SQLite strftime pattern matching the migration's timestamp defaults.
const SQLITE_NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// A validated, fully resolved order ready to persist.
///
/// Assembled by the service layer: the total has already been computed from
/// the caller-supplied item prices and the order number generated.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Customer identity fields (resolved or created by email inside the
    /// creation transaction).
    pub customer: CustomerInput,
    /// Parsed customer email used for the find-first lookup.
    pub email: Email,
    /// Shipping address fields.
    pub address: AddressInput,
    /// Requested line items.
    pub items: Vec<OrderItemInput>,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Workflow status.
    pub status: OrderStatus,
    /// Source channel.
    pub source: OrderSource,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Generated order number.
    pub order_number: String,
    /// Total derived from the requested items, rounded to currency scale.
    pub total_amount: Decimal,
}

/// Filter and paging criteria for order lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Filter by workflow status.
    pub status: Option<OrderStatus>,
    /// Filter by source channel.
    pub source: Option<OrderSource>,
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new order as one atomic unit: customer resolution, address,
    /// order row, and all line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound("product")` if any requested item
    /// references an unknown product; the transaction rolls back and nothing
    /// is persisted. Returns `RepositoryError::Database` for other failures.
    pub async fn create(&self, new: NewOrder) -> Result<OrderWithDetails, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Resolve or lazily create the customer (email is not unique, so
        // this is find-first-match).
        let customer = match customers::find_by_email(&mut tx, &new.email).await? {
            Some(existing) => existing,
            None => customers::create(&mut tx, &new.customer, &new.email).await?,
        };

        let address = insert_address(&mut tx, customer.id, &new.address).await?;

        let order_row = sqlx::query(
            "INSERT INTO orders
                 (order_number, status, source, payment_method, notes,
                  total_amount, customer_id, address_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, order_number, status, source, payment_method, notes,
                       total_amount, customer_id, address_id, created_at, updated_at",
        )
        .bind(&new.order_number)
        .bind(new.status.as_str())
        .bind(new.source.as_str())
        .bind(new.payment_method.as_str())
        .bind(&new.notes)
        .bind(new.total_amount.to_string())
        .bind(customer.id)
        .bind(address.id)
        .fetch_one(&mut *tx)
        .await?;
        let order = order_from_row(&order_row)?;

        let mut order_items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let Some(product) = products::summary_by_id(&mut tx, item.product_id).await? else {
                return Err(RepositoryError::NotFound("product"));
            };

            let item_row = sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, order_id, product_id, quantity, price, created_at",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price.to_string())
            .fetch_one(&mut *tx)
            .await?;

            order_items.push(OrderItemWithProduct {
                item: item_from_row(&item_row)?,
                product,
            });
        }

        tx.commit().await?;

        Ok(OrderWithDetails {
            order,
            customer,
            address,
            order_items,
        })
    }

    /// Fetch a fully populated order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure and
    /// `RepositoryError::DataCorruption` if referenced rows are missing or
    /// hold invalid values.
    pub async fn get_with_details(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithDetails>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let Some(row) = sqlx::query(
            "SELECT id, order_number, status, source, payment_method, notes,
                    total_amount, customer_id, address_id, created_at, updated_at
             FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        hydrate(&mut conn, order).await.map(Some)
    }

    /// List orders newest first, with optional status/source filters.
    ///
    /// Returns the page of populated orders and the total matching count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(
        &self,
        filter: OrderFilter,
    ) -> Result<(Vec<OrderWithDetails>, i64), RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) AS n FROM orders");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&mut *conn)
            .await?
            .try_get("n")?;

        let mut query = QueryBuilder::new(
            "SELECT id, order_number, status, source, payment_method, notes,
                    total_amount, customer_id, address_id, created_at, updated_at
             FROM orders",
        );
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind((filter.page - 1) * filter.limit);

        let rows = query.build().fetch_all(&mut *conn).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order = order_from_row(&row)?;
            orders.push(hydrate(&mut conn, order).await?);
        }

        Ok((orders, total))
    }

    /// List a customer's orders newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<OrderWithDetails>, i64), RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM orders WHERE customer_id = ?1")
            .bind(customer_id)
            .fetch_one(&mut *conn)
            .await?
            .try_get("n")?;

        let rows = sqlx::query(
            "SELECT id, order_number, status, source, payment_method, notes,
                    total_amount, customer_id, address_id, created_at, updated_at
             FROM orders WHERE customer_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(customer_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order = order_from_row(&row)?;
            orders.push(hydrate(&mut conn, order).await?);
        }

        Ok((orders, total))
    }

    /// Apply a partial update (status / payment method / source / notes).
    ///
    /// Items and the stored total are never touched here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound("order")` if the order does not
    /// exist.
    pub async fn update(
        &self,
        id: OrderId,
        changes: &UpdateOrderRequest,
    ) -> Result<OrderWithDetails, RepositoryError> {
        if !changes.is_empty() {
            let mut query =
                QueryBuilder::new(format!("UPDATE orders SET updated_at = {SQLITE_NOW}"));
            if let Some(status) = changes.status {
                query.push(", status = ").push_bind(status.as_str());
            }
            if let Some(method) = changes.payment_method {
                query.push(", payment_method = ").push_bind(method.as_str());
            }
            if let Some(source) = changes.source {
                query.push(", source = ").push_bind(source.as_str());
            }
            if let Some(notes) = &changes.notes {
                query.push(", notes = ").push_bind(notes.clone());
            }
            query.push(" WHERE id = ").push_bind(id);

            let result = query.build().execute(self.pool).await?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound("order"));
            }
        }

        self.get_with_details(id)
            .await?
            .ok_or(RepositoryError::NotFound("order"))
    }

    /// Delete an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound("order")` if the order does not
    /// exist; nothing is deleted in that case.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Items first, to satisfy the foreign key.
        sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("order"));
        }

        tx.commit().await?;
        Ok(())
    }

    /// List an order's items with product summaries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound("order")` if the order does not
    /// exist.
    pub async fn items_with_products(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemWithProduct>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        if !order_exists(&mut conn, order_id).await? {
            return Err(RepositoryError::NotFound("order"));
        }
        items_for_order(&mut conn, order_id).await
    }

    /// Add an item to an existing order, snapshotting the product's current
    /// catalog price, then recompute the stored total. One transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order or product;
    /// the transaction rolls back.
    pub async fn add_item(
        &self,
        order_id: OrderId,
        product_id: mercadito_core::ProductId,
        quantity: i64,
    ) -> Result<OrderItemWithProduct, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !order_exists(&mut tx, order_id).await? {
            return Err(RepositoryError::NotFound("order"));
        }
        let Some(product) = products::summary_by_id(&mut tx, product_id).await? else {
            return Err(RepositoryError::NotFound("product"));
        };

        let row = sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, order_id, product_id, quantity, price, created_at",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(product.price.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let item = item_from_row(&row)?;

        recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(OrderItemWithProduct { item, product })
    }

    /// Apply bulk quantity updates to an order's items, then recompute the
    /// stored total. Updates naming items that do not belong to the order
    /// are skipped, not errors; the recompute runs regardless.
    ///
    /// Returns the order's current items after the update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound("order")` if the order does not
    /// exist.
    pub async fn update_item_quantities(
        &self,
        order_id: OrderId,
        updates: &[ItemQuantityUpdate],
    ) -> Result<Vec<OrderItemWithProduct>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !order_exists(&mut tx, order_id).await? {
            return Err(RepositoryError::NotFound("order"));
        }

        for update in updates {
            // The order_id guard filters out items that belong to some
            // other order; such updates affect zero rows.
            sqlx::query(
                "UPDATE order_items SET quantity = ?1 WHERE id = ?2 AND order_id = ?3",
            )
            .bind(update.quantity)
            .bind(update.id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }

        recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        items_for_order(&mut conn, order_id).await
    }

    /// Aggregate order metrics for rows created at or after `since`.
    ///
    /// Revenue is summed in decimal arithmetic, not by the database, so the
    /// result is exact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn stats_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<OrderStats, RepositoryError> {
        // Match the storage format so string comparison is chronological.
        let cutoff = since.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();

        let rows = sqlx::query(
            "SELECT status, source, payment_method, total_amount
             FROM orders WHERE created_at >= ?1",
        )
        .bind(cutoff)
        .fetch_all(self.pool)
        .await?;

        let mut stats = OrderStats::default();
        for row in rows {
            let status: OrderStatus = enum_column(&row, "status")?;
            let source: OrderSource = enum_column(&row, "source")?;
            let method: PaymentMethod = enum_column(&row, "payment_method")?;

            stats.total_orders += 1;
            stats.total_revenue += decimal_column(&row, "total_amount")?;
            stats.by_status.push(status);
            stats.by_source.push(source);
            stats.by_payment_method.push(method);
        }

        Ok(stats)
    }
}

/// Raw per-order facts for an analytics window.
#[derive(Debug, Default)]
pub struct OrderStats {
    /// Orders in the window.
    pub total_orders: i64,
    /// Exact revenue sum.
    pub total_revenue: Decimal,
    /// Status of each order in the window.
    pub by_status: Vec<OrderStatus>,
    /// Source of each order in the window.
    pub by_source: Vec<OrderSource>,
    /// Payment method of each order in the window.
    pub by_payment_method: Vec<PaymentMethod>,
}

/// Re-derive an order's stored total from its current items.
///
/// This is the single resynchronization point: every item-mutating
/// operation calls it as its final step, inside the same transaction.
pub(crate) async fn recompute_total(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    let rows = sqlx::query("SELECT quantity, price FROM order_items WHERE order_id = ?1")
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in &rows {
        let quantity: i64 = row.try_get("quantity")?;
        lines.push((quantity, decimal_column(row, "price")?));
    }

    let total = pricing::order_total(lines)
        .map_err(|e| RepositoryError::DataCorruption(format!("stored order items: {e}")))?;
    let total = pricing::round_currency(total);

    sqlx::query(&format!(
        "UPDATE orders SET total_amount = ?1, updated_at = {SQLITE_NOW} WHERE id = ?2"
    ))
    .bind(total.to_string())
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn order_exists(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<bool, RepositoryError> {
    let row = sqlx::query("SELECT 1 AS one FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

async fn insert_address(
    conn: &mut SqliteConnection,
    customer_id: CustomerId,
    input: &AddressInput,
) -> Result<Address, RepositoryError> {
    let row = sqlx::query(
        "INSERT INTO addresses (customer_id, street, city, state, zip_code, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, customer_id, street, city, state, zip_code, country, created_at",
    )
    .bind(customer_id)
    .bind(&input.street)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.zip_code)
    .bind(input.country.as_deref().unwrap_or("US"))
    .fetch_one(&mut *conn)
    .await?;

    address_from_row(&row)
}

async fn address_by_id(
    conn: &mut SqliteConnection,
    id: mercadito_core::AddressId,
) -> Result<Option<Address>, RepositoryError> {
    let row = sqlx::query(
        "SELECT id, customer_id, street, city, state, zip_code, country, created_at
         FROM addresses WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(address_from_row).transpose()
}

async fn items_for_order(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItemWithProduct>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price, oi.created_at,
                p.id AS p_id, p.name AS p_name, p.price AS p_price
         FROM order_items oi
         JOIN products p ON p.id = oi.product_id
         WHERE oi.order_id = ?1
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(OrderItemWithProduct {
            item: item_from_row(&row)?,
            product: crate::models::product::ProductSummary {
                id: row.try_get("p_id")?,
                name: row.try_get("p_name")?,
                price: decimal_column(&row, "p_price")?,
            },
        });
    }
    Ok(items)
}

/// Attach customer, address, and items to a bare order row.
async fn hydrate(
    conn: &mut SqliteConnection,
    order: Order,
) -> Result<OrderWithDetails, RepositoryError> {
    let customer = customers::get_by_id(conn, order.customer_id)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order {} references missing customer {}",
                order.id, order.customer_id
            ))
        })?;

    let address = address_by_id(conn, order.address_id).await?.ok_or_else(|| {
        RepositoryError::DataCorruption(format!(
            "order {} references missing address {}",
            order.id, order.address_id
        ))
    })?;

    let order_items = items_for_order(conn, order.id).await?;

    Ok(OrderWithDetails {
        order,
        customer,
        address,
        order_items,
    })
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: OrderFilter) {
    let mut prefix = " WHERE ";
    if let Some(status) = filter.status {
        query.push(prefix).push("status = ").push_bind(status.as_str());
        prefix = " AND ";
    }
    if let Some(source) = filter.source {
        query.push(prefix).push("source = ").push_bind(source.as_str());
    }
}

fn order_from_row(row: &SqliteRow) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        status: enum_column(row, "status")?,
        source: enum_column(row, "source")?,
        payment_method: enum_column(row, "payment_method")?,
        notes: row.try_get("notes")?,
        total_amount: decimal_column(row, "total_amount")?,
        customer_id: row.try_get("customer_id")?,
        address_id: row.try_get("address_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn item_from_row(row: &SqliteRow) -> Result<OrderItem, RepositoryError> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price: decimal_column(row, "price")?,
        created_at: row.try_get("created_at")?,
    })
}

fn address_from_row(row: &SqliteRow) -> Result<Address, RepositoryError> {
    Ok(Address {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        street: row.try_get("street")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        country: row.try_get("country")?,
        created_at: row.try_get("created_at")?,
    })
}
