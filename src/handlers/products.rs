//! Product catalog handlers.

use crate::error::AppError;
use crate::models::Product;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// `active=0` lifts the default active-only filter.
    pub active: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub ok: bool,
    pub items: Vec<Product>,
}

/// List catalog products, newest first.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let active_only = query.active.as_deref() != Some("0");
    let items = state.db.list_products(active_only).await?;
    Ok(Json(ProductListResponse { ok: true, items }))
}
