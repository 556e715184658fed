//! Tab handlers: listing, settlement, and cancellation.

use crate::checkout::Tab;
use crate::error::AppError;
use crate::handlers::registers::CheckoutRequest;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListTabsQuery {
    /// `all=1` includes paid and cancelled tabs.
    pub all: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TabListResponse {
    pub ok: bool,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Serialize)]
pub struct SettleTabResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub tab: Tab,
}

/// List tabs in creation order, open ones only by default.
pub async fn list_tabs(
    State(state): State<AppState>,
    Query(query): Query<ListTabsQuery>,
) -> Result<Json<TabListResponse>, AppError> {
    let include_closed = query.all.as_deref() == Some("1");
    let tabs = state.desk.tabs(include_closed).await?;
    Ok(Json(TabListResponse { ok: true, tabs }))
}

/// Settle an open tab: persist its items as an order, then mark it paid.
///
/// The desk guards the tab for the duration, so a second settlement attempt
/// gets a conflict instead of a double charge. If the order transaction
/// fails the tab is released still open.
pub async fn settle_tab(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<SettleTabResponse>, AppError> {
    let payment_method = payload
        .payment_method
        .unwrap_or_else(|| "cash".to_string());

    let snapshot = state.desk.begin_tab_settlement(tab_id).await?;

    let order_id = match state.db.create_order(&snapshot.items, &payment_method).await {
        Ok(order_id) => order_id,
        Err(e) => {
            if let Err(abort_err) = state.desk.abort_tab_settlement(tab_id).await {
                tracing::error!(
                    error = %abort_err,
                    tab_id = %tab_id,
                    "Failed to release tab after failed settlement"
                );
            }
            return Err(e);
        }
    };

    let tab = state.desk.finish_tab_settlement(tab_id).await?;

    Ok(Json(SettleTabResponse {
        success: true,
        order_id,
        tab,
    }))
}

/// Cancel an open tab. Nothing was persisted for it, so no compensating
/// write is needed.
pub async fn cancel_tab(
    State(state): State<AppState>,
    Path(tab_id): Path<Uuid>,
) -> Result<Json<Tab>, AppError> {
    let tab = state.desk.cancel_tab(tab_id).await?;
    Ok(Json(tab))
}
