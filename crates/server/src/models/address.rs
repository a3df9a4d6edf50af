//! Shipping address domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercadito_core::{AddressId, CustomerId};

/// A shipping address, owned by exactly one customer.
///
/// A fresh address row is created for every order; there is no reuse or
/// deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country code (defaults to "US").
    pub country: String,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
}

/// Address fields supplied with an order-creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    /// Street line (required, non-empty).
    pub street: String,
    /// City (required, non-empty).
    pub city: String,
    /// State or province (required, non-empty).
    pub state: String,
    /// Postal code (required, non-empty).
    pub zip_code: String,
    /// Country code; "US" when omitted.
    pub country: Option<String>,
}
