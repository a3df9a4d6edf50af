//! Database operations for the Mercadito `SQLite` store.
//!
//! ## Tables
//!
//! - `products` - Catalog (read-only from this crate's perspective; the CLI
//!   seeds fixtures)
//! - `customers` - Created lazily the first time an order references a new
//!   email
//! - `addresses` - One per order, owned by a customer
//! - `orders` / `order_items` - The order aggregate; `orders.total_amount`
//!   is derived from items and resynchronized after every item mutation
//!
//! Money columns are exact decimal strings parsed into
//! [`rust_decimal::Decimal`]; a value that fails to parse is reported as
//! [`RepositoryError::DataCorruption`].
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p mercadito-cli -- migrate
//! ```

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;

mod customers;
mod orders;
mod products;

pub use customers::CustomerRepository;
pub use orders::{NewOrder, OrderFilter, OrderRepository, OrderStats};
pub use products::ProductRepository;

/// Embedded migrations for the order store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found. The name is the entity kind
    /// ("order", "product", ...), used in client-facing messages.
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if missing; foreign keys are enforced and
/// WAL journaling is enabled for concurrent readers.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Read a decimal TEXT column from a row.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid decimal in column {column}: {e}"))
    })
}

/// Read an enum TEXT column from a row via `FromStr`.
pub(crate) fn enum_column<T>(row: &SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("in column {column}: {e}")))
}
