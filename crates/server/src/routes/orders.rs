//! Order route handlers.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use mercadito_core::{OrderId, OrderSource, OrderStatus};

use crate::db::OrderFilter;
use crate::error::{AppError, Result};
use crate::models::order::{CreateOrderRequest, UpdateOrderRequest, UpdateStatusRequest};
use crate::state::AppState;

/// Query parameters for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Create an order.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid payloads and
/// `AppError::NotFound` when a referenced product does not exist.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let order = state.orders().create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders, newest first, with optional status/source filters.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status or source value.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let status = query
        .status
        .as_deref()
        .map(OrderStatus::from_str)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let source = query
        .source
        .as_deref()
        .map(OrderSource::from_str)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let (page, limit) = super::sanitize_paging(query.page, query.limit);

    let response = state
        .orders()
        .list_orders(OrderFilter {
            status,
            source,
            page,
            limit,
        })
        .await?;
    Ok(Json(response))
}

/// Fetch one order with its customer, address and items.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown order.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state
        .order_repo()
        .get_with_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;
    Ok(Json(order))
}

/// Partially update an order's status, payment method, source or notes.
///
/// PUT /api/orders/{id}
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty update and
/// `AppError::NotFound` for an unknown order.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse> {
    if req.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_owned()));
    }
    let order = state.order_repo().update(id, &req).await?;
    Ok(Json(order))
}

/// Update only an order's workflow status.
///
/// PUT /api/orders/{id}/status
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown order.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let update = UpdateOrderRequest {
        status: Some(req.status),
        ..UpdateOrderRequest::default()
    };
    let order = state.order_repo().update(id, &update).await?;
    tracing::info!(order_id = %id, status = %req.status, "Order status updated");
    Ok(Json(order))
}

/// Delete an order and its items.
///
/// DELETE /api/orders/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown order.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    state.order_repo().delete(id).await?;
    tracing::info!(order_id = %id, "Order deleted");
    Ok(Json(json!({ "deleted": true })))
}
