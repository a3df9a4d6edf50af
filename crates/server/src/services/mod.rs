//! Business services for the order API.

pub mod orders;

pub use orders::{AnalyticsPeriod, OrderService};
