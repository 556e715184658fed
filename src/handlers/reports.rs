//! Reporting endpoints consumed by the desktop client.

use crate::error::AppError;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct OrdersCountQuery {
    pub range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrdersCountResponse {
    pub count: i64,
}

/// Count of completed orders for the current business day.
pub async fn orders_count(
    State(state): State<AppState>,
    Query(query): Query<OrdersCountQuery>,
) -> Result<Json<OrdersCountResponse>, AppError> {
    match query.range.as_deref() {
        None | Some("today") => {}
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unsupported range: {}",
                other
            )));
        }
    }

    let report = state.reports.orders_count_today().await?;
    Ok(Json(OrdersCountResponse {
        count: report.orders_count,
    }))
}
