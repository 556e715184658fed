//! Order creation handlers.

use crate::error::AppError;
use crate::models::LineItem;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of an incoming order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub qty: i32,
}

impl From<OrderItemInput> for LineItem {
    fn from(input: OrderItemInput) -> Self {
        LineItem {
            product_id: input.product_id,
            name: input.name,
            unit_price: input.unit_price,
            quantity: input.qty,
        }
    }
}

/// Request to create an order straight from a client-held cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub payment_method: Option<String>,
}

/// Response after persisting an order.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: Uuid,
}

/// Create an order.
///
/// The total is computed server-side from the submitted lines; a client
/// supplied total is never trusted. The header and all item rows are
/// written in one transaction.
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let payment_method = payload
        .payment_method
        .unwrap_or_else(|| "cash".to_string());
    let items: Vec<LineItem> = payload.items.into_iter().map(LineItem::from).collect();

    tracing::info!(
        item_count = items.len(),
        payment_method = %payment_method,
        "Creating order"
    );

    let order_id = state.db.create_order(&items, &payment_method).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            success: true,
            order_id,
        }),
    ))
}
