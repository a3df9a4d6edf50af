//! Customer route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use mercadito_core::CustomerId;

use crate::error::Result;
use crate::state::AppState;

/// Paging parameters for a customer's order history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated order history for one customer.
///
/// GET /api/customers/{id}/orders
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown customer.
pub async fn orders(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse> {
    // Distinguish "no orders yet" from "no such customer".
    state
        .customer_repo()
        .get_by_id(customer_id)
        .await?
        .ok_or_else(|| crate::error::AppError::NotFound("Customer".to_owned()))?;

    let (page, limit) = super::sanitize_paging(query.page, query.limit);
    let response = state
        .orders()
        .list_customer_orders(customer_id, page, limit)
        .await?;
    Ok(Json(response))
}
