//! Order analytics route handler.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::error::Result;
use crate::services::AnalyticsPeriod;
use crate::state::AppState;

/// Query parameters for analytics.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Reporting window: "day", "week", "month" or "year".
    pub period: Option<String>,
}

/// Aggregate order metrics for a reporting window. Unknown periods fall
/// back to a month.
///
/// GET /api/orders/analytics
///
/// # Errors
///
/// Returns `AppError::Database` on persistence failure.
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse> {
    let period = AnalyticsPeriod::parse(query.period.as_deref());
    let analytics = state.orders().analytics(period).await?;
    Ok(Json(analytics))
}
