//! Customer repository.
//!
//! Email is not unique at the storage layer; resolution is find-first-match
//! by exact email. The connection-level helpers exist so the order-creation
//! transaction can resolve or create the customer inside its own
//! transaction.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use mercadito_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::customer::{Customer, CustomerInput};

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_by_id(&mut conn, id).await
    }

    /// Find the first customer with the given email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_email(&mut conn, email).await
    }
}

/// Find the first customer with the given email, oldest id first.
pub(crate) async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &Email,
) -> Result<Option<Customer>, RepositoryError> {
    let row = sqlx::query(
        "SELECT id, name, email, phone, created_at, updated_at
         FROM customers WHERE email = ?1 ORDER BY id LIMIT 1",
    )
    .bind(email.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(from_row).transpose()
}

pub(crate) async fn get_by_id(
    conn: &mut SqliteConnection,
    id: CustomerId,
) -> Result<Option<Customer>, RepositoryError> {
    let row = sqlx::query(
        "SELECT id, name, email, phone, created_at, updated_at
         FROM customers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(from_row).transpose()
}

/// Insert a new customer record.
pub(crate) async fn create(
    conn: &mut SqliteConnection,
    input: &CustomerInput,
    email: &Email,
) -> Result<Customer, RepositoryError> {
    let row = sqlx::query(
        "INSERT INTO customers (name, email, phone)
         VALUES (?1, ?2, ?3)
         RETURNING id, name, email, phone, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(email.as_str())
    .bind(&input.phone)
    .fetch_one(&mut *conn)
    .await?;

    from_row(row)
}

pub(crate) fn from_row(row: SqliteRow) -> Result<Customer, RepositoryError> {
    let raw_email: String = row.try_get("email")?;
    let email = Email::parse(&raw_email)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
