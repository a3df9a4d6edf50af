//! Customer domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercadito_core::{CustomerId, Email};

/// A customer record.
///
/// Customers are created lazily: the first order referencing an email not
/// yet on file creates one. Email is not unique at the storage layer;
/// lookups are find-first-match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Full name.
    pub name: String,
    /// Contact email (lookup key for order creation).
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Customer identity fields supplied with an order-creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    /// Full name (required, non-empty).
    pub name: String,
    /// Contact email (required, structurally valid).
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
}
