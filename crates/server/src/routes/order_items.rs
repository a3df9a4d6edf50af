//! Order item route handlers.
//!
//! Every mutation here re-derives the order's stored total from its current
//! items before responding.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use mercadito_core::OrderId;

use crate::error::Result;
use crate::models::order::{AddItemRequest, UpdateItemsRequest};
use crate::state::AppState;

/// List an order's items with product details.
///
/// GET /api/orders/{id}/items
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown order.
pub async fn list(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let items = state.order_repo().items_with_products(order_id).await?;
    Ok(Json(items))
}

/// Add an item to an order at the product's current catalog price.
///
/// POST /api/orders/{id}/items
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a non-positive quantity and
/// `AppError::NotFound` for an unknown order or product.
pub async fn add(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let item = state.orders().add_item(order_id, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Apply bulk quantity updates to an order's items.
///
/// PUT /api/orders/{id}/items
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a non-positive quantity and
/// `AppError::NotFound` for an unknown order.
pub async fn update_quantities(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<UpdateItemsRequest>,
) -> Result<impl IntoResponse> {
    let items = state.orders().update_items(order_id, req).await?;
    Ok(Json(items))
}
