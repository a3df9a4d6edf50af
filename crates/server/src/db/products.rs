//! Catalog product repository.
//!
//! The order subsystem only reads products: existence checks at order
//! creation and current-price lookup when adding an item to an existing
//! order. Inserts exist for the CLI seeding path and tests; full catalog
//! CRUD lives elsewhere.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use mercadito_core::ProductId;

use super::{RepositoryError, decimal_column};
use crate::models::product::{NewProduct, Product, ProductSummary};

/// Repository for catalog product reads (and seed inserts).
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored price is not a valid
    /// decimal.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, sku, price, stock, is_active, created_at, updated_at
             FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(from_row).transpose()
    }

    /// Insert a catalog product and return it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO products (name, description, sku, price, stock, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, description, sku, price, stock, is_active,
                       created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.sku)
        .bind(input.price.to_string())
        .bind(input.stock)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;

        from_row(row)
    }
}

/// Fetch the summary slice of a product inside a transaction.
pub(crate) async fn summary_by_id(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> Result<Option<ProductSummary>, RepositoryError> {
    let row = sqlx::query("SELECT id, name, price FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(summary_from_row).transpose()
}

pub(crate) fn summary_from_row(row: SqliteRow) -> Result<ProductSummary, RepositoryError> {
    Ok(ProductSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: decimal_column(&row, "price")?,
    })
}

fn from_row(row: SqliteRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        sku: row.try_get("sku")?,
        price: decimal_column(&row, "price")?,
        stock: row.try_get("stock")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
