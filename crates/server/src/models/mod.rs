//! Domain models and wire-format DTOs.
//!
//! All DTOs serialize with camelCase field names to match the JSON payloads
//! the storefront and back-office clients exchange.

pub mod address;
pub mod customer;
pub mod order;
pub mod product;
