//! Register (cash desk) handlers: cart building, checkout, and tab opening.

use crate::checkout::{CartView, Tab};
use crate::error::AppError;
use crate::handlers::orders::CreateOrderResponse;
use crate::models::LineItem;
use crate::AppState;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOpenedResponse {
    pub register_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTabRequest {
    pub customer_name: String,
}

/// Open a register with an empty cart.
pub async fn open_register(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RegisterOpenedResponse>), AppError> {
    let register_id = state.desk.open_register().await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterOpenedResponse { register_id }),
    ))
}

/// Close a register, discarding whatever its cart holds.
pub async fn close_register(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.desk.close_register(register_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current cart contents with display totals.
pub async fn view_cart(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
) -> Result<Json<CartView>, AppError> {
    let view = state.desk.cart(register_id).await?;
    Ok(Json(view))
}

/// Drop every line from the cart.
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
) -> Result<Json<CartView>, AppError> {
    let view = state.desk.clear_cart(register_id).await?;
    Ok(Json(view))
}

/// Add a catalog product to the cart. Re-adding a product bumps its quantity
/// instead of duplicating the line.
pub async fn add_item(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<CartView>, AppError> {
    let product = state
        .db
        .find_product(&payload.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not available")))?;

    let line = LineItem {
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        quantity: 1,
    };

    let view = state.desk.add_item(register_id, line).await?;
    Ok(Json(view))
}

pub async fn increment_item(
    State(state): State<AppState>,
    Path((register_id, product_id)): Path<(Uuid, String)>,
) -> Result<Json<CartView>, AppError> {
    let view = state.desk.increment_item(register_id, &product_id).await?;
    Ok(Json(view))
}

/// Decrementing the last unit removes the line entirely.
pub async fn decrement_item(
    State(state): State<AppState>,
    Path((register_id, product_id)): Path<(Uuid, String)>,
) -> Result<Json<CartView>, AppError> {
    let view = state.desk.decrement_item(register_id, &product_id).await?;
    Ok(Json(view))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((register_id, product_id)): Path<(Uuid, String)>,
) -> Result<Json<CartView>, AppError> {
    let view = state.desk.remove_item(register_id, &product_id).await?;
    Ok(Json(view))
}

/// Pay the cart now.
///
/// The desk hands out a settlement snapshot and blocks further cart mutation
/// while the order transaction runs. On success the cart is cleared; on
/// failure the register is released with the cart intact so the cashier can
/// retry.
pub async fn checkout_register(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let payment_method = payload
        .payment_method
        .unwrap_or_else(|| "cash".to_string());

    let snapshot = state.desk.begin_cart_settlement(register_id).await?;

    let order_id = match state.db.create_order(&snapshot.items, &payment_method).await {
        Ok(order_id) => order_id,
        Err(e) => {
            if let Err(abort_err) = state.desk.abort_cart_settlement(register_id).await {
                tracing::error!(
                    error = %abort_err,
                    register_id = %register_id,
                    "Failed to release register after failed checkout"
                );
            }
            return Err(e);
        }
    };

    if let Err(e) = state.desk.finish_cart_settlement(register_id).await {
        // The order is committed; a cleanup failure must not fail the sale.
        tracing::error!(
            error = %e,
            register_id = %register_id,
            order_id = %order_id,
            "Order persisted but register cleanup failed"
        );
    }

    tracing::info!(register_id = %register_id, order_id = %order_id, "Register checkout complete");

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            success: true,
            order_id,
        }),
    ))
}

/// Park the cart as a named pay-later tab and clear the register.
pub async fn save_tab(
    State(state): State<AppState>,
    Path(register_id): Path<Uuid>,
    Json(payload): Json<SaveTabRequest>,
) -> Result<(StatusCode, Json<Tab>), AppError> {
    let tab = state
        .desk
        .save_tab(register_id, &payload.customer_name)
        .await?;
    Ok((StatusCode::CREATED, Json(tab)))
}
